//! 外部工具调用层.
//!
//! 引擎与外部工具之间只有两条通道: 命令行参数与磁盘文件.
//! [`ToolCommand`] 把一次调用连同其预期产物清单一起描述出来,
//! [`Launcher`] 是启动子进程的接缝, 生产实现为 [`SystemLauncher`],
//! 测试则注入 mock 实现来度量并发与调用序列.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use itertools::Itertools;
use once_cell::sync::Lazy;

use crate::error::{McError, Result};

pub mod afni;
pub mod fsl;

#[cfg(test)]
pub(crate) mod testing;

/// 工具二进制覆盖表, 进程启动后只解析一次.
///
/// `MC_TOOL_3DALLINEATE=/opt/afni/3dAllineate` 形式的环境变量可以
/// 重定向对应工具的二进制位置.
static TOOL_OVERRIDES: Lazy<HashMap<String, String>> = Lazy::new(|| {
    std::env::vars()
        .filter_map(|(k, v)| k.strip_prefix("MC_TOOL_").map(|name| (name.to_owned(), v)))
        .collect()
});

/// 解析工具二进制名. `name` 为默认命令名, 如 `3dAllineate`.
fn resolve_bin(name: &str) -> String {
    let key: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();

    TOOL_OVERRIDES
        .get(&key)
        .cloned()
        .unwrap_or_else(|| name.to_owned())
}

/// 一次外部工具调用: 程序、参数、预期产物清单、以及失败定位上下文.
///
/// `creates` 即断点续跑检查的对象: 其全部存在时本次调用被跳过;
/// 调用完成后引擎逐一核验其存在.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
    creates: Vec<PathBuf>,
    context: String,
}

impl ToolCommand {
    /// 构建命令. `name` 为默认二进制名, 可被 `MC_TOOL_*` 环境变量覆盖;
    /// `context` 用于错误信息定位失败阶段, 如 `slice registration (t=0003, z=0012)`.
    pub fn new(name: &str, context: impl Into<String>) -> Self {
        Self {
            program: resolve_bin(name),
            args: Vec::new(),
            creates: Vec::new(),
            context: context.into(),
        }
    }

    /// 追加一个参数.
    #[inline]
    pub fn arg(mut self, a: impl Into<OsString>) -> Self {
        self.args.push(a.into());
        self
    }

    /// 按序追加一组参数.
    pub fn args<I, S>(mut self, it: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(it.into_iter().map(Into::into));
        self
    }

    /// 声明一个预期产物.
    #[inline]
    pub fn creates(mut self, p: impl Into<PathBuf>) -> Self {
        self.creates.push(p.into());
        self
    }

    /// 预期产物清单.
    #[inline]
    pub fn expected(&self) -> &[PathBuf] {
        &self.creates
    }

    /// 首个缺失的预期产物.
    pub fn missing(&self) -> Option<&PathBuf> {
        self.creates.iter().find(|p| !p.exists())
    }

    /// 全部预期产物是否已在磁盘上?
    #[inline]
    pub fn satisfied(&self) -> bool {
        self.missing().is_none()
    }

    /// 程序名.
    #[inline]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// 失败定位上下文.
    #[inline]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// 以退出码 `status` 失败时对应的错误.
    pub(crate) fn failure(&self, status: Option<i32>) -> McError {
        McError::ToolFailure {
            tool: self.program.clone(),
            status,
            context: self.context.clone(),
        }
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.program,
            self.args.iter().map(|a| a.to_string_lossy()).join(" ")
        )
    }
}

/// 一个在飞的外部工具作业句柄.
pub trait JobHandle {
    /// 阻塞等待作业结束, 返回其退出码 (被信号终止时为 `None`).
    fn wait(&mut self) -> std::io::Result<Option<i32>>;
}

/// 外部工具启动器.
pub trait Launcher {
    /// 非阻塞地启动 `cmd`, 返回可等待的句柄.
    fn launch(&self, cmd: &ToolCommand) -> Result<Box<dyn JobHandle>>;
}

/// 以 `std::process::Command` 启动真实子进程的启动器.
#[derive(Debug, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, cmd: &ToolCommand) -> Result<Box<dyn JobHandle>> {
        log::debug!("cmd={cmd}");
        let child = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(McError::Io)?;

        Ok(Box::new(ChildHandle(child)))
    }
}

struct ChildHandle(Child);

impl JobHandle for ChildHandle {
    fn wait(&mut self) -> std::io::Result<Option<i32>> {
        self.0.wait().map(|status| status.code())
    }
}
