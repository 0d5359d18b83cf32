//! 线程化部件
//!
//! 把一个周期采集函数（相机、IMU、串口读数等）包装成线程化部件：
//! 后台线程按周期采集并发布快照，调度线程在 `run_threaded` 中只读取最新快照。

use crate::error::PartError;
use crate::part::{Capabilities, Outputs, Part};
use crate::snapshot::SnapshotCell;
use crate::worker::{BackgroundUpdate, PollingWorker, RunFlag};
use rover_bus::Value;
use std::time::Duration;
use tracing::debug;

type OutputMapper<T> = Box<dyn Fn(&T) -> Outputs + Send>;

/// 周期采集的线程化部件
///
/// # Example
///
/// ```
/// use rover_driver::{Part, ThreadedPart};
/// use rover_bus::Value;
/// use std::time::Duration;
///
/// let mut reading = 0.0;
/// let mut part = ThreadedPart::polling(
///     0.0_f64,
///     Duration::from_millis(10),
///     move || {
///         reading += 0.5;
///         Ok(reading)
///     },
///     |v: &f64| vec![Value::Float(*v)],
/// );
/// // 后台线程尚未运行时返回初始快照
/// assert_eq!(part.run_threaded(&[]).unwrap(), vec![Value::Float(0.0)]);
/// ```
pub struct ThreadedPart<T> {
    cell: SnapshotCell<T>,
    stop: RunFlag,
    worker: Option<Box<dyn BackgroundUpdate>>,
    to_outputs: OutputMapper<T>,
    shut_down: bool,
}

impl<T: Send + Sync + 'static> ThreadedPart<T> {
    /// 创建周期采集部件
    ///
    /// - `initial`：后台线程首次发布前 `run_threaded` 返回的状态
    /// - `period`：采集周期
    /// - `poll`：采集函数，返回错误时保留上一次快照
    /// - `to_outputs`：把快照映射为总线输出
    pub fn polling<F, M>(initial: T, period: Duration, poll: F, to_outputs: M) -> Self
    where
        F: FnMut() -> Result<T, PartError> + Send + 'static,
        M: Fn(&T) -> Outputs + Send + 'static,
    {
        let cell = SnapshotCell::new(initial);
        let stop = RunFlag::new();
        let worker = PollingWorker::new(cell.clone(), period, poll).with_stop_flag(stop.clone());
        Self {
            cell,
            stop,
            worker: Some(Box::new(worker)),
            to_outputs: Box::new(to_outputs),
            shut_down: false,
        }
    }

    /// 快照单元（可用于测试或诊断）
    pub fn snapshot(&self) -> SnapshotCell<T> {
        self.cell.clone()
    }

    /// 对应的能力声明
    pub fn capabilities() -> Capabilities {
        Capabilities::threaded()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl<T: Send + Sync + 'static> Part for ThreadedPart<T> {
    fn run_threaded(&mut self, _inputs: &[Option<Value>]) -> Result<Outputs, PartError> {
        let snapshot = self.cell.load();
        Ok((self.to_outputs)(&snapshot))
    }

    fn take_background(&mut self) -> Option<Box<dyn BackgroundUpdate>> {
        self.worker.take()
    }

    fn shutdown(&mut self) -> Result<(), PartError> {
        if self.shut_down {
            return Ok(());
        }
        self.stop.stop();
        self.shut_down = true;
        debug!("Threaded part released after {} publishes", self.cell.version());
        Ok(())
    }
}
