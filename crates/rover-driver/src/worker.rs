//! 后台线程管理
//!
//! - `RunFlag`：协作式停止标志（调度器翻转，后台循环检查）
//! - `BackgroundUpdate`：在独立线程上运行的更新循环
//! - `PollingWorker`：按周期调用采集函数并发布快照的通用 worker
//! - `WorkerHandle`：带超时 join 的线程句柄

use crate::error::{DriverError, PartError};
use crate::snapshot::SnapshotCell;
use crossbeam_channel::{RecvTimeoutError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// 运行标志
///
/// 克隆共享同一标志。`stop()` 之后不可恢复。
#[derive(Debug, Clone)]
pub struct RunFlag {
    inner: Arc<AtomicBool>,
}

impl RunFlag {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.inner.store(false, Ordering::Release);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// 后台更新循环
///
/// 实现必须定期检查 `running`，标志清除后尽快返回；调度器在停止时
/// 只等待有限的宽限期。
pub trait BackgroundUpdate: Send + 'static {
    fn update(&mut self, running: &RunFlag);
}

/// 周期采集 worker
///
/// 每个周期调用一次采集函数：成功则发布到快照单元；失败则记录警告并保留
/// 上一次的有效快照。车辆标志或本地停止标志任一清除时退出。
pub struct PollingWorker<T, F> {
    cell: SnapshotCell<T>,
    local: RunFlag,
    period: Duration,
    poll: F,
}

impl<T, F> PollingWorker<T, F>
where
    T: Send + Sync + 'static,
    F: FnMut() -> Result<T, PartError> + Send + 'static,
{
    pub fn new(cell: SnapshotCell<T>, period: Duration, poll: F) -> Self {
        Self {
            cell,
            local: RunFlag::new(),
            period,
            poll,
        }
    }

    /// 附加本地停止标志（由部件的 `shutdown` 翻转）
    pub fn with_stop_flag(mut self, flag: RunFlag) -> Self {
        self.local = flag;
        self
    }
}

impl<T, F> BackgroundUpdate for PollingWorker<T, F>
where
    T: Send + Sync + 'static,
    F: FnMut() -> Result<T, PartError> + Send + 'static,
{
    fn update(&mut self, running: &RunFlag) {
        let mut failures: u64 = 0;
        while running.is_running() && self.local.is_running() {
            match (self.poll)() {
                Ok(value) => self.cell.publish(value),
                Err(e) => {
                    failures += 1;
                    warn!("Background poll failed, keeping last snapshot: {}", e);
                },
            }
            thread::sleep(self.period);
        }
        debug!(
            "Polling worker exited after {} publishes ({} failures)",
            self.cell.version(),
            failures
        );
    }
}

/// 后台线程句柄
#[derive(Debug)]
pub struct WorkerHandle {
    name: String,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// 等待线程退出，最多等待 `timeout`
    ///
    /// 超时后 watchdog 线程继续等待目标线程，进程退出时由操作系统回收。
    pub fn join_timeout(self, timeout: Duration) -> thread::Result<()> {
        let (tx, rx) = bounded(1);
        let handle = self.handle;

        thread::spawn(move || {
            let result = handle.join();
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result,
            Err(RecvTimeoutError::Timeout) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Thread join timeout",
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "Thread panicked during join",
            ))),
        }
    }
}

/// 在命名线程上运行后台 worker
pub fn spawn_worker(
    part: &str,
    mut worker: Box<dyn BackgroundUpdate>,
    running: RunFlag,
) -> Result<WorkerHandle, DriverError> {
    let thread_name = format!("rover-{}", part);
    let handle = thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            trace!("worker thread started");
            worker.update(&running);
            trace!("worker thread exiting");
        })
        .map_err(|source| DriverError::WorkerSpawn {
            part: part.to_string(),
            source,
        })?;

    debug!("Spawned worker thread {}", thread_name);
    Ok(WorkerHandle {
        name: part.to_string(),
        handle,
    })
}
