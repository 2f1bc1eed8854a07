//! FSL 工具命令构造.

use std::path::{Path, PathBuf};

use super::ToolCommand;

/// 把 4D 序列按时间拆成 3D 分卷 (`fslsplit ... -t`).
///
/// 输出名为 `<前缀><4 位时间索引>.nii.gz`; `expected` 是按 t 升序的
/// 全部预期输出, 由调用方从 header 的 frame 数推出.
pub fn split_t(series: &Path, out_prefix: &Path, expected: Vec<PathBuf>) -> ToolCommand {
    let mut cmd = ToolCommand::new("fslsplit", "volume splitting")
        .arg(series)
        .arg(out_prefix)
        .arg("-t");
    for p in expected {
        cmd = cmd.creates(p);
    }
    cmd
}

/// 把 3D 卷按 Z 拆成 2D 切片 (`fslslice`).
///
/// 输出名为 `<stem>_slice_<4 位切片索引>.nii.gz`; `expected` 是按 Z 升序的
/// 全部预期输出, 由调用方从 header 的 Z 层数推出.
pub fn slice_z(
    vol: &Path,
    out_stem: &Path,
    expected: Vec<PathBuf>,
    context: impl Into<String>,
) -> ToolCommand {
    let mut cmd = ToolCommand::new("fslslice", context).arg(vol).arg(out_stem);
    for p in expected {
        cmd = cmd.creates(p);
    }
    cmd
}

/// 把拼接好的 NIfTI 序列规范化复制为最终输出 (`fslmaths <in> <out>`).
pub fn normalize_copy(src: &Path, dst: &Path) -> ToolCommand {
    ToolCommand::new("fslmaths", "final normalization")
        .arg(src)
        .arg(dst)
        .creates(dst)
}
