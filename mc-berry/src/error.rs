//! 运行时错误.

use std::path::PathBuf;

use thiserror::Error;

use crate::Shape3;

/// 引擎统一错误类型.
///
/// 引擎不做局部恢复: 任何错误都会终止整次运行, scratch 目录原样保留,
/// 供事后检查与断点续跑.
#[derive(Debug, Error)]
pub enum McError {
    /// 所需文件在期望位置不存在.
    ///
    /// frame / slice 数量在启动时即从 NIfTI header 得出, 因此文件缺失
    /// 一律是真实错误, 而不是 "序列到头了" 的信号.
    #[error("missing input file: {0}")]
    MissingInput(PathBuf),

    /// 参考卷或权重卷的体素网格与输入序列不一致.
    #[error("grid mismatch for {}: expected {expected:?}, found {found:?}", .path.display())]
    GridMismatch {
        /// 网格不符的文件.
        path: PathBuf,

        /// 输入序列的空间形状.
        expected: Shape3,

        /// 该文件的实际空间形状.
        found: Shape3,
    },

    /// 图像维度与期望不符 (如把 3D 卷当作 4D 序列传入).
    #[error("{}: expected {expected}D image, found {found}D", .path.display())]
    WrongDimensionality {
        /// 维度不符的文件.
        path: PathBuf,

        /// 期望的维度个数.
        expected: usize,

        /// header 中记录的维度个数.
        found: usize,
    },

    /// 外部工具以非零状态退出 (被信号终止时 `status` 为 `None`).
    ///
    /// 引擎不重试, 直接传播首个失败.
    #[error("external tool `{tool}` failed with status {status:?} during {context}")]
    ToolFailure {
        /// 失败的外部工具程序名.
        tool: String,

        /// 子进程退出码.
        status: Option<i32>,

        /// 失败阶段描述, 含时间点 / 切片索引.
        context: String,
    },

    /// 底层 IO 错误.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// NIfTI 读写错误.
    #[error("nifti error: {0}")]
    Nifti(#[from] nifti::NiftiError),
}

/// 本 crate 的统一 `Result` 别名.
pub type Result<T> = std::result::Result<T, McError>;
