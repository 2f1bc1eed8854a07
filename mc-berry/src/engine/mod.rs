//! 配准引擎编排.
//!
//! 阶段次序: 参考卷准备 -> 全卷线性预配准 -> 参考 / 权重 / 序列拆分 ->
//! 逐时间点切片配准 (有界池 + 屏障) -> 两级重组 -> 规范化输出 ->
//! 质量诊断 -> 清理. 每一步都受断点续跑检查约束.

use std::fs;
use std::path::PathBuf;

use crate::config::RegisterConfig;
use crate::consts::scratch;
use crate::data::{HeaderAttr, SeriesMeta};
use crate::error::{McError, Result};
use crate::quality;
use crate::tools::{fsl, Launcher, SystemLauncher};

mod assemble;
mod cleanup;
mod pool;
mod prereg;
mod resume;
mod slices;
mod split;

pub use pool::JobPool;

/// scratch 目录内的固定文件布局.
pub(crate) struct Scratch {
    dir: PathBuf,
}

impl Scratch {
    pub(crate) fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// 时间中值参考卷.
    pub(crate) fn median(&self) -> PathBuf {
        self.dir.join(scratch::MEDIAN_NAME)
    }

    /// 质量诊断卷.
    pub(crate) fn absdiff_mean(&self) -> PathBuf {
        self.dir.join(scratch::ABSDIFF_MEAN_NAME)
    }

    /// 按时间拆分的输出前缀 (外部工具在其后追加 4 位索引).
    pub(crate) fn time_prefix(&self) -> PathBuf {
        self.dir.join(scratch::TIME_PREFIX)
    }

    /// 第 `t` 个时间点分卷.
    pub(crate) fn time_vol(&self, t: usize) -> PathBuf {
        self.dir.join(scratch::time_vol(t))
    }

    /// 第 `t` 个时间点分卷的 stem (切片拆分的输出前缀).
    pub(crate) fn time_stem(&self, t: usize) -> PathBuf {
        self.dir.join(scratch::time_stem(t))
    }

    /// 时间点 `t` 的第 `i` 个输入切片.
    pub(crate) fn time_slice(&self, t: usize, i: usize) -> PathBuf {
        self.dir.join(scratch::time_slice(t, i))
    }

    /// 参考卷切片的输出 stem.
    pub(crate) fn ref_stem(&self) -> PathBuf {
        self.dir.join(scratch::REF_STEM)
    }

    /// 参考卷的第 `i` 个切片.
    pub(crate) fn ref_slice(&self, i: usize) -> PathBuf {
        self.dir.join(scratch::ref_slice(i))
    }

    /// 权重卷切片的输出 stem.
    pub(crate) fn weights_stem(&self) -> PathBuf {
        self.dir.join(scratch::WEIGHTS_STEM)
    }

    /// 权重卷的第 `i` 个切片.
    pub(crate) fn weights_slice(&self, i: usize) -> PathBuf {
        self.dir.join(scratch::weights_slice(i))
    }

    /// 时间点 `t` 第 `i` 个切片的配准输出.
    pub(crate) fn reg_slice(&self, t: usize, i: usize) -> PathBuf {
        self.dir.join(scratch::reg_slice(t, i))
    }

    /// 时间点 `t` 的 3D 拼接前缀.
    pub(crate) fn reg_time_prefix(&self, t: usize) -> PathBuf {
        self.dir.join(scratch::reg_time_prefix(t))
    }

    /// 时间点 `t` 拼接产物的 BRIK (时间点级断点续跑标记).
    pub(crate) fn reg_time_brik(&self, t: usize) -> PathBuf {
        self.dir.join(scratch::reg_time_brik(t))
    }

    /// 时间点 `t` 拼接产物的 HEAD.
    pub(crate) fn reg_time_head(&self, t: usize) -> PathBuf {
        self.dir.join(scratch::reg_time_head(t))
    }

    /// 最终 4D 拼接的数据集前缀.
    pub(crate) fn reg_prefix(&self) -> PathBuf {
        self.dir.join(scratch::REG_PREFIX)
    }

    /// 最终 4D 拼接产物的 BRIK.
    pub(crate) fn reg_brik(&self) -> PathBuf {
        self.dir.join("reg+orig.BRIK")
    }

    /// 最终 4D 拼接产物的 HEAD.
    pub(crate) fn reg_head(&self) -> PathBuf {
        self.dir.join("reg+orig.HEAD")
    }

    /// 最终 4D 拼接的 AFNI 数据集名 (格式转换的输入).
    pub(crate) fn reg_orig(&self) -> PathBuf {
        self.dir.join("reg+orig")
    }

    /// 转换后的最终 NIfTI 序列.
    pub(crate) fn reg_nii(&self) -> PathBuf {
        self.dir.join("reg.nii")
    }
}

/// 引擎产出的全部文件位置.
#[derive(Debug, Clone)]
pub struct RegisterOutputs {
    /// 最终运动校正序列.
    pub out: PathBuf,

    /// 全卷线性预配准 (粗校正) 序列.
    pub out_init_mc: PathBuf,

    /// 线性运动参数 (ASCII).
    pub param_1d: PathBuf,

    /// 12 参数仿射矩阵 (ASCII).
    pub matrix_1d: PathBuf,

    /// 实际使用的参考卷 (显式给定的, 或引擎计算的时间中值).
    pub reference: PathBuf,
}

/// 以系统子进程启动器执行一次完整配准. 引擎的公开入口.
pub fn register(cfg: &RegisterConfig) -> Result<RegisterOutputs> {
    register_with(cfg, &SystemLauncher)
}

/// 以显式启动器执行一次完整配准.
///
/// 生产代码用 [`register`]; 测试经由该入口注入 mock 启动器,
/// 以度量并发上限、屏障与断点续跑行为.
pub fn register_with(cfg: &RegisterConfig, launcher: &dyn Launcher) -> Result<RegisterOutputs> {
    for p in [&cfg.func, &cfg.weights] {
        if !p.is_file() {
            return Err(McError::MissingInput(p.clone()));
        }
    }
    fs::create_dir_all(&cfg.workdir)?;
    let scratch = Scratch::new(&cfg.workdir);

    let meta = SeriesMeta::open(&cfg.func)?;
    if meta.ndim() != 4 {
        return Err(McError::WrongDimensionality {
            path: cfg.func.clone(),
            expected: 4,
            found: meta.ndim(),
        });
    }
    let (nt, nz) = (meta.nt(), meta.nz());
    let tr = cfg.tr_override.unwrap_or_else(|| meta.tr());
    log::info!(
        "series {}: {nt} timepoints x {nz} slices, TR = {tr}s",
        cfg.func.display()
    );

    let reference = prereg::ensure_reference(cfg, &scratch)?;
    meta.check_grid(&reference)?;
    meta.check_grid(&cfg.weights)?;

    prereg::preregister(launcher, cfg, &reference)?;

    if !cfg.out.is_file() {
        if !scratch.reg_nii().is_file() {
            split::slice_ref_and_weights(launcher, &scratch, &reference, &cfg.weights, nz)?;
            split::split_series(launcher, &scratch, &cfg.out_init_mc, nt)?;

            for t in 0..nt {
                slices::register_timepoint(launcher, &scratch, cfg, t, nz)?;
            }

            assemble::assemble_series(launcher, &scratch, nt, tr)?;
        }
        resume::run_if_needed(launcher, &fsl::normalize_copy(&scratch.reg_nii(), &cfg.out))?;
    }

    quality::write_absdiff_mean(&cfg.out, &reference, &cfg.weights, &scratch.absdiff_mean());

    cleanup::after_series(&scratch, cfg.retention, nt, nz)?;

    log::info!("motion corrected series written to {}", cfg.out.display());
    Ok(RegisterOutputs {
        out: cfg.out.clone(),
        out_init_mc: cfg.out_init_mc.clone(),
        param_1d: cfg.param_1d.clone(),
        matrix_1d: cfg.matrix_1d.clone(),
        reference,
    })
}
