#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 将 4D fMRI 时间序列逐时间点、逐 Z 切片地非线性配准到参考卷,
//! 以校正头动与场致畸变残差.
//!
//! 引擎自身不做配准数值计算; 配准本体由 AFNI `3dAllineate` 等外部命令行工具
//! 完成, 引擎视其为黑盒. 引擎负责的是系统性工作:
//!
//! 1. 拆分: 序列按时间拆成 3D 分卷, 分卷与参考 / 权重卷按 Z 拆成 2D 切片;
//! 2. 全卷线性预配准: 一次粗校正, 降低每个切片作业要修正的残余运动;
//! 3. 逐切片非线性配准: 每个 (时间点, 切片) 对应一个外部子进程,
//!    以有界 FIFO 池限制在飞数量, 每个时间点结束处设同步屏障;
//! 4. 重组: 切片按 Z 升序拼回 3D 卷, 分卷按 t 升序拼回 4D 序列, 保持原 TR;
//! 5. 断点续跑: 任何外部调用前先检查其预期产物, 已存在则跳过;
//! 6. 质量诊断与中间产物清理.
//!
//! # 注意
//!
//! 1. 一个 scratch 目录同一时刻只允许一次运行独占使用.
//! 2. frame / slice 数量在启动时即从 NIfTI header 得出;
//!    运行中任何预期文件缺失都是错误, 而不是序列结束的信号.
//! 3. 任一外部工具非零退出即终止整次运行, 不做局部重试;
//!    scratch 目录原样保留, 修正后重跑会跳过全部已完成产物.

/// 三维体素形状 / 三维索引, `(W, H, Z)` 次序.
pub type Shape3 = (usize, usize, usize);

pub mod consts;

mod config;

pub use config::{NwarpBasis, RegisterConfig, Retention};

mod error;

pub use error::{McError, Result};

/// NIfTI 序列 / 卷数据结构.
mod data;

pub use data::{temporal_median, HeaderAttr, Series4d, SeriesMeta, Volume3d};

/// 外部工具调用层.
mod tools;

pub use tools::{JobHandle, Launcher, SystemLauncher, ToolCommand};

/// 配准引擎编排.
mod engine;

pub use engine::{register, register_with, JobPool, RegisterOutputs};

mod quality;

pub use quality::write_absdiff_mean;

pub mod prelude;
