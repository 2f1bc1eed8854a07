//! 拆分阶段: 序列按时间拆卷, 卷按 Z 拆片.

use std::path::Path;

use super::resume;
use super::Scratch;
use crate::error::{McError, Result};
use crate::tools::{fsl, Launcher};

/// 把参考卷与权重卷按 Z 拆成 2D 切片.
///
/// 两份切片在所有配准作业间只读共享, 整次运行只拆一次.
pub(crate) fn slice_ref_and_weights(
    launcher: &dyn Launcher,
    scratch: &Scratch,
    reference: &Path,
    weights: &Path,
    nz: usize,
) -> Result<()> {
    let expected = (0..nz).map(|i| scratch.ref_slice(i)).collect();
    resume::run_if_needed(
        launcher,
        &fsl::slice_z(reference, &scratch.ref_stem(), expected, "reference slicing"),
    )?;

    let expected = (0..nz).map(|i| scratch.weights_slice(i)).collect();
    resume::run_if_needed(
        launcher,
        &fsl::slice_z(weights, &scratch.weights_stem(), expected, "weights slicing"),
    )
}

/// 把预配准后的 4D 序列按时间拆成 `nt` 个 3D 分卷.
pub(crate) fn split_series(
    launcher: &dyn Launcher,
    scratch: &Scratch,
    series: &Path,
    nt: usize,
) -> Result<()> {
    let expected = (0..nt).map(|t| scratch.time_vol(t)).collect();
    resume::run_if_needed(
        launcher,
        &fsl::split_t(series, &scratch.time_prefix(), expected),
    )
}

/// 把时间点 `t` 的 3D 分卷按 Z 拆成 `nz` 个 2D 切片.
pub(crate) fn slice_timepoint(
    launcher: &dyn Launcher,
    scratch: &Scratch,
    t: usize,
    nz: usize,
) -> Result<()> {
    let vol = scratch.time_vol(t);
    if !vol.is_file() {
        return Err(McError::MissingInput(vol));
    }

    let expected = (0..nz).map(|i| scratch.time_slice(t, i)).collect();
    resume::run_if_needed(
        launcher,
        &fsl::slice_z(
            &vol,
            &scratch.time_stem(t),
            expected,
            format!("timepoint slicing (t={t:04})"),
        ),
    )
}
