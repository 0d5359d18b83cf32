//! 驱动层模块
//!
//! 本模块提供车辆主循环（调度器）及部件并发约定，包括：
//! - `Part` 能力约定（同步运行 / 线程读取 / 后台更新 / 关闭）与显式描述符
//! - `Vehicle` 定频调度循环（按声明顺序读总线、调用部件、写回总线）
//! - 后台线程管理（`RunFlag` 协作式停止、带超时的 join）
//! - `SnapshotCell` 单生产者/单消费者快照（ArcSwap 无锁读取）
//! - `RateDivider` 分频器
//! - 部件耗时剖析与循环指标
//!
//! # 线程模型
//!
//! 调度线程独占 `Bus`；每个声明了后台更新的部件额外拥有一个独立线程，
//! 后台线程只通过 `SnapshotCell` 向调度线程交付数据，不接触总线。

mod error;
pub mod metrics;
pub mod part;
pub mod profiler;
pub mod rate;
pub mod snapshot;
pub mod threaded;
mod vehicle;
pub mod worker;

pub use error::{DriverError, PartError};
pub use metrics::{LoopMetrics, LoopMetricsSnapshot};
pub use part::{Capabilities, Capability, FnPart, Inputs, Outputs, Part, PartDescriptor};
pub use profiler::PartProfiler;
pub use rate::RateDivider;
pub use snapshot::SnapshotCell;
pub use threaded::ThreadedPart;
pub use vehicle::{LoopConfig, LoopSummary, Vehicle};
pub use worker::{BackgroundUpdate, PollingWorker, RunFlag, WorkerHandle};
