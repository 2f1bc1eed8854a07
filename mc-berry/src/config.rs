//! 引擎配置.
//!
//! 所有路径与参数都由调用方显式给出; 引擎不读取进程当前目录,
//! 也没有任何进程级可变默认值.

use std::path::{Path, PathBuf};

use crate::consts::{DEFAULT_FINEBLUR, DEFAULT_MAX_INFLIGHT};

/// 非线性形变的多项式基, 即外部切片配准工具的 `-nwarp` 参数取值.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum NwarpBasis {
    /// 三次多项式.
    Cubic,

    /// 五次多项式.
    Quintic,

    /// 七次多项式 (默认).
    #[default]
    Heptic,

    /// 九次多项式.
    Nonic,
}

impl NwarpBasis {
    /// 外部工具命令行上的参数字面量.
    #[inline]
    pub const fn as_arg(self) -> &'static str {
        match self {
            NwarpBasis::Cubic => "cubic",
            NwarpBasis::Quintic => "quintic",
            NwarpBasis::Heptic => "heptic",
            NwarpBasis::Nonic => "nonic",
        }
    }
}

/// 中间产物保留策略.
///
/// 一次完整运行会产生数千个切片级中间文件. 默认在消费后即删
/// (切片文件在该时间点拼接完成后删, 分卷与参考 / 权重切片在最终序列
/// 就位后删); 调试或检查配准行为时可改为全部保留.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Retention {
    /// 中间产物一经消费即删除 (默认).
    #[default]
    RemoveConsumed,

    /// 保留所有中间产物.
    KeepAll,
}

/// 一次配准运行的完整配置.
///
/// 由 [`RegisterConfig::new`] 以默认输出命名构建, 各字段均可在提交引擎前
/// 直接改写.
#[derive(Clone, Debug)]
pub struct RegisterConfig {
    /// 待校正的 4D 功能序列 (NIfTI).
    pub func: PathBuf,

    /// 配准权重卷, 与参考卷同一网格. 每个配准作业以其对应切片
    /// 压低不可信体素的贡献.
    pub weights: PathBuf,

    /// 显式参考卷. `None` 时引擎计算输入序列的逐体素时间中值并以其为参考.
    pub reference: Option<PathBuf>,

    /// scratch 目录. 由本次运行独占; 断点续跑时须传同一目录.
    pub workdir: PathBuf,

    /// 最终运动校正序列的输出路径.
    pub out: PathBuf,

    /// 全卷线性预配准 (粗校正) 序列的输出路径.
    pub out_init_mc: PathBuf,

    /// 线性运动参数文件 (ASCII, 每个子卷一行) 的输出路径.
    pub param_1d: PathBuf,

    /// 12 参数仿射矩阵文件 (ASCII) 的输出路径.
    pub matrix_1d: PathBuf,

    /// 非线性形变基.
    pub nwarp: NwarpBasis,

    /// 切片配准的 fineblur 半径.
    pub fineblur: f32,

    /// 同时在飞的配准子进程数上限.
    pub max_inflight: usize,

    /// 中间产物保留策略.
    pub retention: Retention,

    /// 覆盖从 header 读出的 TR (秒). 一般无需设置.
    pub tr_override: Option<f64>,
}

impl RegisterConfig {
    /// 以默认输出命名构建配置.
    ///
    /// 输出文件名由 `func` 的文件名 stem 推导, 全部落在 `workdir` 下:
    /// `<stem>_mc.nii.gz`, `<stem>_prelim-mc.nii.gz`, `<stem>.param.1D`,
    /// `<stem>.aff12.1D`. 该命名与下游流水线阶段约定一致.
    pub fn new<P1, P2, P3>(func: P1, weights: P2, workdir: P3) -> Self
    where
        P1: Into<PathBuf>,
        P2: Into<PathBuf>,
        P3: Into<PathBuf>,
    {
        let func = func.into();
        let workdir = workdir.into();
        let stem = series_stem(&func);

        Self {
            out: workdir.join(format!("{stem}_mc.nii.gz")),
            out_init_mc: workdir.join(format!("{stem}_prelim-mc.nii.gz")),
            param_1d: workdir.join(format!("{stem}.param.1D")),
            matrix_1d: workdir.join(format!("{stem}.aff12.1D")),
            func,
            weights: weights.into(),
            reference: None,
            workdir,
            nwarp: NwarpBasis::default(),
            fineblur: DEFAULT_FINEBLUR,
            max_inflight: DEFAULT_MAX_INFLIGHT,
            retention: Retention::default(),
            tr_override: None,
        }
    }
}

/// 去掉 NIfTI 文件名的 `.nii` / `.nii.gz` 后缀.
fn series_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("func");
    for suffix in [".nii.gz", ".nii"] {
        if let Some(stem) = name.strip_suffix(suffix) {
            return stem.to_owned();
        }
    }
    name.to_owned()
}
