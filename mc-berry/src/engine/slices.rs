//! 逐时间点的切片配准. 引擎的核心阶段.

use std::path::PathBuf;

use super::pool::JobPool;
use super::{cleanup, resume, split, Scratch};
use crate::config::RegisterConfig;
use crate::error::{McError, Result};
use crate::tools::{afni, Launcher};

/// 配准时间点 `t` 的全部 Z 切片并拼回 3D 卷.
///
/// 时间点级断点续跑标记是其拼接产物 (`reg_time_<t>+orig.BRIK`);
/// 标记存在时整个时间点跳过. 所有切片作业经有界池提交, 时间点末尾
/// 的 [`JobPool::drain`] 构成同步屏障: 拼接从不会看到配准到一半的
/// 时间点.
pub(crate) fn register_timepoint(
    launcher: &dyn Launcher,
    scratch: &Scratch,
    cfg: &RegisterConfig,
    t: usize,
    nz: usize,
) -> Result<()> {
    if scratch.reg_time_brik(t).is_file() {
        log::debug!("timepoint {t:04} already assembled, skip");
        return Ok(());
    }

    split::slice_timepoint(launcher, scratch, t, nz)?;

    log::info!("registering timepoint {t:04} ({nz} slices)");
    let mut pool = JobPool::new(launcher, cfg.max_inflight);
    let submitted = submit_all(&mut pool, scratch, cfg, t, nz);
    let drained = pool.drain();
    submitted?;
    drained?;

    // 屏障之后核验全部切片产物, 再按 Z 升序显式列出拼接.
    let slices: Vec<PathBuf> = (0..nz).map(|i| scratch.reg_slice(t, i)).collect();
    if let Some(missing) = slices.iter().find(|p| !p.is_file()) {
        return Err(McError::MissingInput(missing.clone()));
    }
    resume::run_if_needed(
        launcher,
        &afni::zcat(
            &scratch.reg_time_prefix(t),
            &slices,
            scratch.reg_time_brik(t),
            scratch.reg_time_head(t),
            t,
        ),
    )?;

    cleanup::after_timepoint(scratch, cfg.retention, t, nz)
}

/// 提交时间点 `t` 的全部切片作业.
///
/// 每个作业的输入三件套 (功能切片、权重切片、参考切片) 必须齐备;
/// 切片数来自 header, 文件缺失没有 "序列到头" 的语义, 一律报错.
/// 池因失败取消后不再提交.
fn submit_all(
    pool: &mut JobPool<'_>,
    scratch: &Scratch,
    cfg: &RegisterConfig,
    t: usize,
    nz: usize,
) -> Result<()> {
    for i in 0..nz {
        if pool.cancelled() {
            break;
        }

        let func = scratch.time_slice(t, i);
        let weight = scratch.weights_slice(i);
        let base = scratch.ref_slice(i);
        for p in [&func, &weight, &base] {
            if !p.is_file() {
                return Err(McError::MissingInput(p.clone()));
            }
        }

        pool.submit(&afni::allineate_slice(
            &func,
            &weight,
            &base,
            &scratch.reg_slice(t, i),
            cfg.nwarp,
            cfg.fineblur,
            t,
            i,
        ));
    }
    Ok(())
}
