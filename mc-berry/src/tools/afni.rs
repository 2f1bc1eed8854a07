//! AFNI 工具命令构造.
//!
//! 参数排布与 shell 版流水线保持一致, 便于对照外部工具文档核查.

use std::path::{Path, PathBuf};

use super::ToolCommand;
use crate::config::NwarpBasis;

/// 全卷线性预配准 (`3dAllineate`).
///
/// 对整条 4D 序列做一次加权仿射配准, 产出粗校正序列与
/// 线性参数 / 仿射矩阵两份 ASCII 文件.
pub fn allineate_volume(
    func: &Path,
    reference: &Path,
    weights: &Path,
    out_init_mc: &Path,
    param_1d: &Path,
    matrix_1d: &Path,
) -> ToolCommand {
    ToolCommand::new("3dAllineate", "whole-volume preregistration")
        .arg("-weight")
        .arg(weights)
        .arg("-base")
        .arg(reference)
        .arg("-source")
        .arg(func)
        .arg("-prefix")
        .arg(out_init_mc)
        .arg("-1Dparam_save")
        .arg(param_1d)
        .arg("-1Dmatrix_save")
        .arg(matrix_1d)
        .creates(out_init_mc)
        .creates(param_1d)
        .creates(matrix_1d)
}

/// 单个 (t, i) 切片的非线性配准 (`3dAllineate -onepass -nwarp`).
#[allow(clippy::too_many_arguments)]
pub fn allineate_slice(
    func_slice: &Path,
    weight_slice: &Path,
    ref_slice: &Path,
    out_slice: &Path,
    nwarp: NwarpBasis,
    fineblur: f32,
    t: usize,
    i: usize,
) -> ToolCommand {
    ToolCommand::new(
        "3dAllineate",
        format!("slice registration (t={t:04}, z={i:04})"),
    )
    .arg("-onepass")
    .arg("-nwarp")
    .arg(nwarp.as_arg())
    .arg("-fineblur")
    .arg(format!("{fineblur:.2}"))
    .arg("-weight")
    .arg(weight_slice)
    .arg("-base")
    .arg(ref_slice)
    .arg("-source")
    .arg(func_slice)
    .arg("-prefix")
    .arg(out_slice)
    .creates(out_slice)
}

/// 把时间点 `t` 的全部已配准切片拼回 3D 卷 (`3dZcat`).
///
/// `slices` 由调用方按 Z 升序显式给出, 其顺序即拼接顺序;
/// 拼接从不依赖目录遍历顺序.
pub fn zcat(prefix: &Path, slices: &[PathBuf], brik: PathBuf, head: PathBuf, t: usize) -> ToolCommand {
    ToolCommand::new("3dZcat", format!("slice reassembly (t={t:04})"))
        .arg("-prefix")
        .arg(prefix)
        .args(slices)
        .creates(brik)
        .creates(head)
}

/// 把全部时间点 3D 卷按 t 升序拼回 4D 序列 (`3dTcat -tr`).
///
/// `tr` 以秒为单位, 写入结果序列, 保证输出 TR 等于输入 TR.
pub fn tcat(tr: f64, prefix: &Path, briks: &[PathBuf], brik: PathBuf, head: PathBuf) -> ToolCommand {
    ToolCommand::new("3dTcat", "series reassembly")
        .arg("-tr")
        .arg(format!("{tr}"))
        .arg("-prefix")
        .arg(prefix)
        .args(briks)
        .creates(brik)
        .creates(head)
}

/// AFNI BRIK/HEAD 数据集转换为 NIfTI (`3dAFNItoNIFTI`).
pub fn afni_to_nifti(prefix: &Path, dataset: &Path, out_nii: PathBuf) -> ToolCommand {
    ToolCommand::new("3dAFNItoNIFTI", "nifti conversion")
        .arg("-prefix")
        .arg(prefix)
        .arg(dataset)
        .creates(out_nii)
}
