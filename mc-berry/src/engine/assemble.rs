//! 4D 序列重组与格式转换.

use std::path::PathBuf;

use super::{resume, Scratch};
use crate::error::Result;
use crate::tools::{afni, Launcher};

/// 把全部时间点 3D 卷按 t 升序拼回 4D 序列并转换为 NIfTI.
///
/// 结果序列携带原始 TR, frame 数等于输入序列的 frame 数.
pub(crate) fn assemble_series(
    launcher: &dyn Launcher,
    scratch: &Scratch,
    nt: usize,
    tr: f64,
) -> Result<()> {
    let briks: Vec<PathBuf> = (0..nt).map(|t| scratch.reg_time_brik(t)).collect();
    resume::run_if_needed(
        launcher,
        &afni::tcat(
            tr,
            &scratch.reg_prefix(),
            &briks,
            scratch.reg_brik(),
            scratch.reg_head(),
        ),
    )?;

    resume::run_if_needed(
        launcher,
        &afni::afni_to_nifti(&scratch.reg_prefix(), &scratch.reg_orig(), scratch.reg_nii()),
    )
}
