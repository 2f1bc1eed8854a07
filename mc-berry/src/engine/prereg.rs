//! 参考卷准备与全卷线性预配准.

use std::path::PathBuf;

use super::resume;
use super::Scratch;
use crate::config::RegisterConfig;
use crate::data::{self, temporal_median, HeaderAttr, Series4d};
use crate::error::{McError, Result};
use crate::tools::{afni, Launcher};

/// 确保参考卷就位, 返回其路径.
///
/// 显式给定时仅核验存在; 未给定时计算输入序列的逐体素时间中值并写入
/// scratch 目录 (已存在则跳过, 与外部阶段同样的断点续跑语义).
pub(crate) fn ensure_reference(cfg: &RegisterConfig, scratch: &Scratch) -> Result<PathBuf> {
    if let Some(reference) = &cfg.reference {
        if !reference.is_file() {
            return Err(McError::MissingInput(reference.clone()));
        }
        return Ok(reference.clone());
    }

    let median = scratch.median();
    if !median.is_file() {
        log::info!("no reference supplied, computing temporal median of {}", cfg.func.display());
        let series = Series4d::open(&cfg.func)?;
        let med = temporal_median(series.data());
        data::write_volume(&median, &med, series.header())?;
    }
    Ok(median)
}

/// 全卷线性预配准.
///
/// 一次加权仿射把大幅头动先行吸收, 之后每个切片作业只需修正
/// 残余形变, 既省时又不易陷入局部极值. 三份产物齐备时整段跳过.
pub(crate) fn preregister(
    launcher: &dyn Launcher,
    cfg: &RegisterConfig,
    reference: &std::path::Path,
) -> Result<()> {
    resume::run_if_needed(
        launcher,
        &afni::allineate_volume(
            &cfg.func,
            reference,
            &cfg.weights,
            &cfg.out_init_mc,
            &cfg.param_1d,
            &cfg.matrix_1d,
        ),
    )
}
