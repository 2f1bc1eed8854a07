//! 常用功能一站式导入.

pub use crate::consts::{DEFAULT_FINEBLUR, DEFAULT_MAX_INFLIGHT};

pub use crate::{register, register_with, RegisterConfig, RegisterOutputs};

pub use crate::{HeaderAttr, NwarpBasis, Retention, SeriesMeta};

pub use crate::{Launcher, McError, Result, SystemLauncher};
