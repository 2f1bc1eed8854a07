//! 断点续跑检查.
//!
//! 任何外部调用在启动前, 先检查其预期产物是否已在磁盘上;
//! 全部存在则视为该步骤刚刚完成, 直接跳过. 该策略对每个阶段一视同仁:
//! 拆分、预配准、切片配准、拼接、规范化.

use crate::error::{McError, Result};
use crate::tools::{Launcher, ToolCommand};

/// 需要时同步执行 `cmd`.
///
/// 预期产物已齐备时跳过; 否则启动子进程、等待退出、核验产物.
/// 非零退出与产物缺失都是硬错误.
pub(crate) fn run_if_needed(launcher: &dyn Launcher, cmd: &ToolCommand) -> Result<()> {
    if cmd.satisfied() {
        log::debug!("up to date, skip: {cmd}");
        return Ok(());
    }

    let mut handle = launcher.launch(cmd)?;
    match handle.wait()? {
        Some(0) => {}
        status => return Err(cmd.failure(status)),
    }
    verify(cmd)
}

/// 核验 `cmd` 的全部预期产物都已落盘.
pub(crate) fn verify(cmd: &ToolCommand) -> Result<()> {
    match cmd.missing() {
        None => Ok(()),
        Some(p) => Err(McError::MissingInput(p.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::MockLauncher;
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let d = std::env::temp_dir().join(format!("mc-berry-resume-{tag}-{}", std::process::id()));
        if d.exists() {
            fs::remove_dir_all(&d).unwrap();
        }
        fs::create_dir_all(&d).unwrap();
        d
    }

    #[test]
    fn test_skip_when_satisfied() {
        let dir = scratch_dir("skip");
        let out = dir.join("done.nii.gz");
        fs::write(&out, b"").unwrap();

        let launcher = MockLauncher::new();
        let cmd = ToolCommand::new("fslmaths", "final normalization").creates(&out);
        run_if_needed(&launcher, &cmd).unwrap();

        assert_eq!(launcher.launch_count(), 0);
    }

    #[test]
    fn test_run_and_verify() {
        let dir = scratch_dir("run");
        let out = dir.join("fresh.nii.gz");

        let launcher = MockLauncher::new();
        let cmd = ToolCommand::new("fslmaths", "final normalization").creates(&out);
        run_if_needed(&launcher, &cmd).unwrap();

        assert_eq!(launcher.launch_count(), 1);
        assert!(out.is_file());
    }

    #[test]
    fn test_nonzero_exit_is_fatal() {
        let dir = scratch_dir("fail");
        let out = dir.join("never.nii.gz");

        let launcher = MockLauncher::new();
        launcher.fail_on("final normalization");
        let cmd = ToolCommand::new("fslmaths", "final normalization").creates(&out);
        let e = run_if_needed(&launcher, &cmd).unwrap_err();

        assert!(matches!(e, McError::ToolFailure { status: Some(1), .. }));
        assert!(!out.exists());
    }

    #[test]
    fn test_lying_tool_is_missing_input() {
        // 工具零退出却没有产出文件: 按产物缺失报错, 不静默放过.
        let dir = scratch_dir("lying");
        let out = dir.join("claimed.nii.gz");

        let launcher = MockLauncher::new();
        launcher.no_touch_on("final normalization");
        let cmd = ToolCommand::new("fslmaths", "final normalization").creates(&out);
        let e = run_if_needed(&launcher, &cmd).unwrap_err();

        assert!(matches!(e, McError::MissingInput(p) if p == out));
    }
}
