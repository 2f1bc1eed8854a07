//! 测试用 mock 启动器.
//!
//! 不产生任何真实子进程: `launch` 记录调用并维护在飞计数,
//! `wait` 时落盘该命令声明的预期产物 (成功路径), 以此驱动引擎
//! 走完与真实运行相同的文件流.

use std::cell::{Cell, RefCell};
use std::fs;
use std::rc::Rc;

use super::{JobHandle, Launcher, ToolCommand};
use crate::error::Result;

/// 一次被 mock 执行的调用记录.
#[derive(Debug, Clone)]
pub(crate) struct LaunchRecord {
    /// 程序名.
    pub program: String,

    /// 失败定位上下文.
    pub context: String,

    /// 本次 launch 完成后的在飞作业数 (含本作业).
    pub inflight_after: usize,
}

#[derive(Default)]
struct MockState {
    inflight: Cell<usize>,
    max_inflight: Cell<usize>,
    launched: RefCell<Vec<LaunchRecord>>,

    /// 上下文含其中任一子串的作业以退出码 1 失败.
    fail_contexts: RefCell<Vec<String>>,

    /// 上下文含其中任一子串的作业 "成功" 但不落盘产物.
    no_touch_contexts: RefCell<Vec<String>>,
}

/// 单线程 mock 启动器. 引擎协调循环本身是单线程的, 因此用 `Rc` + `Cell` 即可.
#[derive(Default)]
pub(crate) struct MockLauncher {
    state: Rc<MockState>,
}

impl MockLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 令上下文含 `needle` 的作业以退出码 1 失败.
    pub fn fail_on(&self, needle: &str) {
        self.state.fail_contexts.borrow_mut().push(needle.to_owned());
    }

    /// 令上下文含 `needle` 的作业成功退出但不落盘产物.
    pub fn no_touch_on(&self, needle: &str) {
        self.state
            .no_touch_contexts
            .borrow_mut()
            .push(needle.to_owned());
    }

    /// 全部调用记录.
    pub fn launched(&self) -> Vec<LaunchRecord> {
        self.state.launched.borrow().clone()
    }

    /// 调用总数.
    pub fn launch_count(&self) -> usize {
        self.state.launched.borrow().len()
    }

    /// 观测到的最大在飞作业数.
    pub fn max_inflight(&self) -> usize {
        self.state.max_inflight.get()
    }

    /// 程序名等于 `program` 的调用数.
    pub fn count_of(&self, program: &str) -> usize {
        self.state
            .launched
            .borrow()
            .iter()
            .filter(|r| r.program == program)
            .count()
    }

    /// 上下文含 `needle` 的调用数.
    pub fn count_with_context(&self, needle: &str) -> usize {
        self.state
            .launched
            .borrow()
            .iter()
            .filter(|r| r.context.contains(needle))
            .count()
    }

    fn matches(list: &RefCell<Vec<String>>, context: &str) -> bool {
        list.borrow().iter().any(|n| context.contains(n))
    }
}

impl Launcher for MockLauncher {
    fn launch(&self, cmd: &ToolCommand) -> Result<Box<dyn JobHandle>> {
        let st = &self.state;
        st.inflight.set(st.inflight.get() + 1);
        st.max_inflight
            .set(st.max_inflight.get().max(st.inflight.get()));
        st.launched.borrow_mut().push(LaunchRecord {
            program: cmd.program().to_owned(),
            context: cmd.context().to_owned(),
            inflight_after: st.inflight.get(),
        });

        let code = if Self::matches(&st.fail_contexts, cmd.context()) {
            1
        } else {
            0
        };
        let touch = code == 0 && !Self::matches(&st.no_touch_contexts, cmd.context());

        Ok(Box::new(MockHandle {
            state: Rc::clone(&self.state),
            creates: if touch {
                cmd.expected().to_vec()
            } else {
                Vec::new()
            },
            code,
            done: false,
        }))
    }
}

struct MockHandle {
    state: Rc<MockState>,
    creates: Vec<std::path::PathBuf>,
    code: i32,
    done: bool,
}

impl JobHandle for MockHandle {
    fn wait(&mut self) -> std::io::Result<Option<i32>> {
        if !self.done {
            self.done = true;
            self.state.inflight.set(self.state.inflight.get() - 1);
            for p in &self.creates {
                fs::write(p, b"")?;
            }
        }
        Ok(Some(self.code))
    }
}
