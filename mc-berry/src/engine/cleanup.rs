//! 中间产物清理.
//!
//! 只删除已被后续阶段消费掉的文件: 时间点的切片在其 3D 拼接产物
//! 就位后删, 分卷 / 参考切片 / 权重切片 / BRIK 在最终序列就位后删.
//! 输入、声明的输出与中值参考卷从不删除, 因此中断后重跑所需的
//! 断点状态始终完好.

use std::fs;
use std::path::Path;

use super::Scratch;
use crate::config::Retention;
use crate::error::Result;

/// 时间点 `t` 拼接完成后, 删除其已消费的切片文件.
pub(crate) fn after_timepoint(
    scratch: &Scratch,
    retention: Retention,
    t: usize,
    nz: usize,
) -> Result<()> {
    if retention == Retention::KeepAll {
        return Ok(());
    }
    debug_assert!(scratch.reg_time_brik(t).is_file());

    for i in 0..nz {
        remove_existing(&scratch.reg_slice(t, i))?;
        remove_existing(&scratch.time_slice(t, i))?;
    }
    Ok(())
}

/// 最终序列就位后, 删除全部剩余中间产物.
pub(crate) fn after_series(
    scratch: &Scratch,
    retention: Retention,
    nt: usize,
    nz: usize,
) -> Result<()> {
    if retention == Retention::KeepAll {
        return Ok(());
    }

    for t in 0..nt {
        remove_existing(&scratch.time_vol(t))?;
        remove_existing(&scratch.reg_time_brik(t))?;
        remove_existing(&scratch.reg_time_head(t))?;
    }
    for i in 0..nz {
        remove_existing(&scratch.ref_slice(i))?;
        remove_existing(&scratch.weights_slice(i))?;
    }
    remove_existing(&scratch.reg_brik())?;
    remove_existing(&scratch.reg_head())?;
    Ok(())
}

/// 删除 `path` (若存在).
fn remove_existing(path: &Path) -> Result<()> {
    if path.is_file() {
        fs::remove_file(path)?;
    }
    Ok(())
}
