//! 通用常量与 scratch 文件命名规则.

/// 默认同时在飞 (in-flight) 的配准子进程数上限.
pub const DEFAULT_MAX_INFLIGHT: usize = 10;

/// 默认 fineblur 半径, 传递给非线性切片配准工具.
pub const DEFAULT_FINEBLUR: f32 = 0.5;

/// 中间文件索引的零填充宽度. 下游流水线按该宽度匹配文件名, 不可更改.
pub const INDEX_WIDTH: usize = 4;

/// scratch 目录内的文件命名规则.
///
/// 所有名字与下游流水线阶段逐字节约定一致: 分卷为 `<前缀>_time_<4 位索引>`,
/// 切片为 `<...>_slice_<4 位索引>`.
pub mod scratch {
    use super::INDEX_WIDTH;

    /// 未显式给定参考卷时, 引擎计算的时间中值参考卷文件名.
    pub const MEDIAN_NAME: &str = "func_median.nii.gz";

    /// 质量诊断卷 (掩膜加权平均绝对差) 文件名.
    pub const ABSDIFF_MEAN_NAME: &str = "absdiff_mean.nii.gz";

    /// 按时间拆分时传给外部工具的输出前缀.
    pub const TIME_PREFIX: &str = "func_time_";

    /// 参考卷切片的输出 stem.
    pub const REF_STEM: &str = "ref";

    /// 权重卷切片的输出 stem.
    pub const WEIGHTS_STEM: &str = "weights";

    /// 最终 4D 拼接的 AFNI 数据集前缀.
    pub const REG_PREFIX: &str = "reg";

    /// 第 `t` 个时间点分卷的文件名, 形如 `func_time_0007.nii.gz`.
    #[inline]
    pub fn time_vol(t: usize) -> String {
        format!("{TIME_PREFIX}{t:0INDEX_WIDTH$}.nii.gz")
    }

    /// 第 `t` 个时间点分卷的无扩展名 stem, 形如 `func_time_0007`.
    /// 切片拆分工具以此为输出 stem.
    #[inline]
    pub fn time_stem(t: usize) -> String {
        format!("{TIME_PREFIX}{t:0INDEX_WIDTH$}")
    }

    /// 时间点 `t` 的第 `i` 个输入切片, 形如 `func_time_0007_slice_0012.nii.gz`.
    #[inline]
    pub fn time_slice(t: usize, i: usize) -> String {
        format!("{TIME_PREFIX}{t:0INDEX_WIDTH$}_slice_{i:0INDEX_WIDTH$}.nii.gz")
    }

    /// 参考卷的第 `i` 个切片.
    #[inline]
    pub fn ref_slice(i: usize) -> String {
        format!("{REF_STEM}_slice_{i:0INDEX_WIDTH$}.nii.gz")
    }

    /// 权重卷的第 `i` 个切片.
    #[inline]
    pub fn weights_slice(i: usize) -> String {
        format!("{WEIGHTS_STEM}_slice_{i:0INDEX_WIDTH$}.nii.gz")
    }

    /// 时间点 `t` 第 `i` 个切片的配准输出.
    #[inline]
    pub fn reg_slice(t: usize, i: usize) -> String {
        format!("{REG_PREFIX}_time_{t:0INDEX_WIDTH$}_slice_{i:0INDEX_WIDTH$}.nii.gz")
    }

    /// 时间点 `t` 的 3D 拼接数据集前缀 (AFNI `-prefix` 参数).
    #[inline]
    pub fn reg_time_prefix(t: usize) -> String {
        format!("{REG_PREFIX}_time_{t:0INDEX_WIDTH$}")
    }

    /// 时间点 `t` 拼接产物的 BRIK 文件名. 该文件同时是时间点级断点续跑标记.
    #[inline]
    pub fn reg_time_brik(t: usize) -> String {
        format!("{REG_PREFIX}_time_{t:0INDEX_WIDTH$}+orig.BRIK")
    }

    /// 时间点 `t` 拼接产物的 HEAD 文件名.
    #[inline]
    pub fn reg_time_head(t: usize) -> String {
        format!("{REG_PREFIX}_time_{t:0INDEX_WIDTH$}+orig.HEAD")
    }
}

#[cfg(test)]
mod tests {
    use super::scratch::*;

    #[test]
    fn test_scratch_names() {
        assert_eq!(time_vol(0), "func_time_0000.nii.gz");
        assert_eq!(time_vol(1234), "func_time_1234.nii.gz");
        assert_eq!(time_stem(7), "func_time_0007");
        assert_eq!(time_slice(7, 12), "func_time_0007_slice_0012.nii.gz");
        assert_eq!(ref_slice(3), "ref_slice_0003.nii.gz");
        assert_eq!(weights_slice(0), "weights_slice_0000.nii.gz");
        assert_eq!(reg_slice(7, 12), "reg_time_0007_slice_0012.nii.gz");
        assert_eq!(reg_time_prefix(7), "reg_time_0007");
        assert_eq!(reg_time_brik(7), "reg_time_0007+orig.BRIK");
        assert_eq!(reg_time_head(7), "reg_time_0007+orig.HEAD");
    }
}
