//! 逐切片运动校正的独立运行器.
//!
//! 不解析命令行参数; 全部输入由环境变量给出, 缺省回落到
//! `{用户主目录}/dataset/mc` 布局:
//!
//! - `MC_FUNC`: 待校正 4D 序列 (默认 `func.nii.gz`)
//! - `MC_WEIGHTS`: 配准权重卷 (默认 `weights.nii.gz`)
//! - `MC_REF`: 显式参考卷 (默认不设, 取时间中值)
//! - `MC_TMPDIR`: scratch 目录 (默认 `scratch/`)

use std::env;
use std::path::PathBuf;

use mc_berry::prelude::*;

/// 读取路径环境变量.
fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

/// 获取 `{用户主目录}/dataset/mc` 目录下给定项的全路径.
fn home_mc_dir_with(name: &str) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.extend(["dataset", "mc", name]);
    Some(ans)
}

/// 可并行核心数.
fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

fn main() {
    simple_logger::SimpleLogger::new().init().unwrap();

    let func = env_path("MC_FUNC")
        .or_else(|| home_mc_dir_with("func.nii.gz"))
        .expect("MC_FUNC not set and home directory unavailable");
    let weights = env_path("MC_WEIGHTS")
        .or_else(|| home_mc_dir_with("weights.nii.gz"))
        .expect("MC_WEIGHTS not set and home directory unavailable");
    let workdir = env_path("MC_TMPDIR")
        .or_else(|| home_mc_dir_with("scratch"))
        .expect("MC_TMPDIR not set and home directory unavailable");

    assert!(func.is_file(), "functional series not found: {func:?}");
    assert!(weights.is_file(), "weights volume not found: {weights:?}");

    let mut cfg = RegisterConfig::new(func, weights, workdir);
    cfg.reference = env_path("MC_REF");
    cfg.max_inflight = DEFAULT_MAX_INFLIGHT.min(cpus()).max(1);

    match register(&cfg) {
        Ok(outs) => {
            log::info!("motion corrected series: {}", outs.out.display());
            log::info!("motion parameters: {}", outs.param_1d.display());
        }
        Err(e) => {
            log::error!("registration failed: {e}");
            std::process::exit(1);
        }
    }
}
