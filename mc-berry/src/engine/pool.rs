//! 有界 FIFO 子进程池.

use std::collections::VecDeque;

use crate::error::{McError, Result};
use crate::tools::{JobHandle, Launcher, ToolCommand};

/// 有界先进先出子进程池.
///
/// 在飞句柄数永不超过 `limit`: 提交新作业前, 池若已满, 先阻塞等待
/// 最老的在飞作业结束, 再启动新作业.
///
/// 任一作业失败 (启动失败或非零退出) 后池进入取消状态, 之后的提交
/// 一律不再启动; 已在飞的作业仍会在 [`drain`](Self::drain) 中全部等完,
/// 以保证 scratch 目录处于可续跑的干净状态. 首个失败由 `drain` 返回.
pub struct JobPool<'a> {
    launcher: &'a dyn Launcher,
    inflight: VecDeque<(ToolCommand, Box<dyn JobHandle>)>,
    limit: usize,
    failure: Option<McError>,
}

impl<'a> JobPool<'a> {
    /// 创建容量为 `limit` 的池.
    ///
    /// # Panics
    ///
    /// `limit` 为 0 时 panic.
    pub fn new(launcher: &'a dyn Launcher, limit: usize) -> Self {
        assert!(limit > 0, "job pool limit must be positive");
        Self {
            launcher,
            inflight: VecDeque::with_capacity(limit),
            limit,
            failure: None,
        }
    }

    /// 池是否已因失败而取消后续提交?
    #[inline]
    pub fn cancelled(&self) -> bool {
        self.failure.is_some()
    }

    /// 当前在飞作业数.
    #[inline]
    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }

    /// 提交一个作业.
    ///
    /// 作业的预期产物已齐备时直接跳过 (断点续跑); 池满时先等待最老的
    /// 在飞作业; 池已取消时提交被静默丢弃, 错误统一由 [`drain`](Self::drain)
    /// 返回.
    pub fn submit(&mut self, cmd: &ToolCommand) {
        if self.failure.is_some() {
            return;
        }
        if cmd.satisfied() {
            log::debug!("up to date, skip: {cmd}");
            return;
        }
        if self.inflight.len() >= self.limit {
            self.wait_oldest();
            if self.failure.is_some() {
                return;
            }
        }

        match self.launcher.launch(cmd) {
            Ok(handle) => self.inflight.push_back((cmd.clone(), handle)),
            Err(e) => self.note_failure(e),
        }
    }

    /// 同步屏障: 等待全部在飞作业结束.
    ///
    /// 返回首个失败 (若有). 无论成败, 返回时池一定为空, 且失败状态被重置.
    pub fn drain(&mut self) -> Result<()> {
        while !self.inflight.is_empty() {
            self.wait_oldest();
        }
        match self.failure.take() {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// 等待最老的在飞作业结束并出队.
    fn wait_oldest(&mut self) {
        if let Some((cmd, mut handle)) = self.inflight.pop_front() {
            match handle.wait() {
                Ok(Some(0)) => {}
                Ok(status) => self.note_failure(cmd.failure(status)),
                Err(e) => self.note_failure(e.into()),
            }
        }
    }

    /// 记录首个失败并进入取消状态.
    fn note_failure(&mut self, e: McError) {
        log::error!("registration job failed: {e}");
        if self.failure.is_none() {
            self.failure = Some(e);
        }
    }
}

impl Drop for JobPool<'_> {
    fn drop(&mut self) {
        // 提前返回错误的路径上也不遗留孤儿子进程.
        while !self.inflight.is_empty() {
            self.wait_oldest();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::MockLauncher;
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let d = std::env::temp_dir().join(format!("mc-berry-pool-{tag}-{}", std::process::id()));
        if d.exists() {
            fs::remove_dir_all(&d).unwrap();
        }
        fs::create_dir_all(&d).unwrap();
        d
    }

    fn job(dir: &std::path::Path, t: usize, i: usize) -> ToolCommand {
        ToolCommand::new(
            "3dAllineate",
            format!("slice registration (t={t:04}, z={i:04})"),
        )
        .creates(dir.join(crate::consts::scratch::reg_slice(t, i)))
    }

    #[test]
    fn test_bound_never_exceeded() {
        let dir = scratch_dir("bound");
        let launcher = MockLauncher::new();
        let mut pool = JobPool::new(&launcher, 10);

        for i in 0..25 {
            pool.submit(&job(&dir, 0, i));
        }
        pool.drain().unwrap();

        assert_eq!(launcher.launch_count(), 25);
        assert_eq!(launcher.max_inflight(), 10);
        assert_eq!(pool.inflight(), 0);
    }

    #[test]
    fn test_fifo_wait_order() {
        // 池满时等待的是最老的作业; 记录中的在飞数应呈 1..=limit 后稳定在 limit.
        let dir = scratch_dir("fifo");
        let launcher = MockLauncher::new();
        let mut pool = JobPool::new(&launcher, 3);

        for i in 0..6 {
            pool.submit(&job(&dir, 0, i));
        }
        pool.drain().unwrap();

        let inflight: Vec<usize> = launcher
            .launched()
            .iter()
            .map(|r| r.inflight_after)
            .collect();
        assert_eq!(inflight, vec![1, 2, 3, 3, 3, 3]);
    }

    #[test]
    fn test_resume_skips_satisfied_jobs() {
        let dir = scratch_dir("resume");
        let done = job(&dir, 0, 0);
        fs::write(&done.expected()[0], b"").unwrap();

        let launcher = MockLauncher::new();
        let mut pool = JobPool::new(&launcher, 10);
        pool.submit(&done);
        pool.submit(&job(&dir, 0, 1));
        pool.drain().unwrap();

        assert_eq!(launcher.launch_count(), 1);
        assert_eq!(launcher.count_with_context("z=0001"), 1);
    }

    #[test]
    fn test_failure_cancels_following_submissions() {
        let dir = scratch_dir("cancel");
        let launcher = MockLauncher::new();
        launcher.fail_on("z=0000");
        let mut pool = JobPool::new(&launcher, 2);

        for i in 0..8 {
            pool.submit(&job(&dir, 0, i));
        }
        let e = pool.drain().unwrap_err();

        assert!(matches!(e, McError::ToolFailure { .. }));
        assert!(e.to_string().contains("z=0000"));
        // 失败在第 3 个提交把池挤满时才被发现; 之后不再有新作业启动.
        assert!(launcher.launch_count() < 8);
        assert_eq!(pool.inflight(), 0);
    }

    #[test]
    #[should_panic(expected = "job pool limit must be positive")]
    fn test_zero_limit_panics() {
        let launcher = MockLauncher::new();
        let _ = JobPool::new(&launcher, 0);
    }

    /// 多线程压力下校验在飞上限: 作业在真实线程池里完成,
    /// `wait` 通过 channel 与之同步.
    #[test]
    fn test_bound_under_threaded_completion() {
        use crate::tools::{JobHandle, Launcher};
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::mpsc::{channel, Receiver};
        use std::sync::Arc;

        struct ThreadedLauncher {
            workers: threadpool::ThreadPool,
            inflight: Arc<AtomicUsize>,
            max_seen: Arc<AtomicUsize>,
        }

        struct ThreadedHandle {
            rx: Receiver<()>,
            waited: bool,
        }

        impl JobHandle for ThreadedHandle {
            fn wait(&mut self) -> std::io::Result<Option<i32>> {
                if !self.waited {
                    self.waited = true;
                    self.rx.recv().expect("worker thread died");
                }
                Ok(Some(0))
            }
        }

        impl Launcher for ThreadedLauncher {
            fn launch(&self, _cmd: &ToolCommand) -> crate::Result<Box<dyn JobHandle>> {
                let n = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_seen.fetch_max(n, Ordering::SeqCst);

                let (tx, rx) = channel();
                let inflight = Arc::clone(&self.inflight);
                self.workers.execute(move || {
                    std::thread::sleep(std::time::Duration::from_millis(2));
                    inflight.fetch_sub(1, Ordering::SeqCst);
                    tx.send(()).ok();
                });
                Ok(Box::new(ThreadedHandle { rx, waited: false }))
            }
        }

        let launcher = ThreadedLauncher {
            workers: threadpool::ThreadPool::new(num_cpus::get().max(16)),
            inflight: Arc::new(AtomicUsize::new(0)),
            max_seen: Arc::new(AtomicUsize::new(0)),
        };

        let dir = scratch_dir("threaded");
        let mut pool = JobPool::new(&launcher, 7);
        for i in 0..64 {
            // 预期产物从不落盘, 保证每个作业都真实启动.
            pool.submit(
                &ToolCommand::new(
                    "3dAllineate",
                    format!("slice registration (t=0000, z={i:04})"),
                )
                .creates(dir.join(crate::consts::scratch::reg_slice(0, i))),
            );
        }
        pool.drain().unwrap();

        assert!(launcher.max_seen.load(Ordering::SeqCst) <= 7);
        assert!(launcher.inflight.load(Ordering::SeqCst) == 0);
    }
}
