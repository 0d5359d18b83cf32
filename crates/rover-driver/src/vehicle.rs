//! 车辆调度循环
//!
//! `Vehicle` 持有总线和按声明顺序注册的部件。每个 tick 对每个部件依次：
//! 1. 检查运行条件通道（未写入或为假时跳过）
//! 2. 从总线读取声明的输入通道
//! 3. 按能力调用 `run` 或 `run_threaded`
//! 4. 把输出写回声明的输出通道
//!
//! 同一 tick 内，前面部件的输出对后面的部件可见。

use crate::error::{DriverError, PartError};
use crate::metrics::LoopMetrics;
use crate::part::{Inputs, Part, PartDescriptor};
use crate::profiler::PartProfiler;
use crate::worker::{BackgroundUpdate, RunFlag, WorkerHandle, spawn_worker};
use rover_bus::{Bus, Value};
use rover_tools::DriveConfig;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// 调度循环配置
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// 主循环频率（Hz）
    pub rate_hz: f64,

    /// 最大循环次数（None 表示一直运行直到停止）
    ///
    /// 达到次数后立即结束，最后一个 tick 之后不再休眠。
    pub max_loop_count: Option<u64>,

    /// 输出抖动告警和周期性性能报告
    pub verbose: bool,

    /// 停止时等待后台线程退出的宽限期
    pub shutdown_grace: Duration,

    /// verbose 模式下每隔多少次循环输出一次性能报告（0 表示不输出）
    pub profile_interval: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            rate_hz: 10.0,
            max_loop_count: None,
            verbose: false,
            shutdown_grace: Duration::from_millis(300),
            profile_interval: 200,
        }
    }
}

impl From<&DriveConfig> for LoopConfig {
    fn from(config: &DriveConfig) -> Self {
        LoopConfig {
            rate_hz: config.vehicle_hz,
            max_loop_count: config.max_loops,
            verbose: config.verbose,
            shutdown_grace: config.shutdown_grace(),
            profile_interval: config.profile_interval,
        }
    }
}

/// 调度循环结束时的统计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSummary {
    /// 执行的 tick 数
    pub loop_count: u64,
    /// 循环总耗时
    pub elapsed: Duration,
}

impl LoopSummary {
    /// 实际平均频率（Hz）
    pub fn effective_hz(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.loop_count as f64 / secs
    }
}

struct PartEntry {
    part: Box<dyn Part>,
    descriptor: PartDescriptor,
    worker: Option<Box<dyn BackgroundUpdate>>,
    thread: Option<WorkerHandle>,
}

/// 车辆（调度器）
///
/// # Example
///
/// ```
/// use rover_driver::{FnPart, LoopConfig, PartDescriptor, Vehicle};
/// use rover_bus::Value;
///
/// let mut vehicle = Vehicle::new();
/// vehicle
///     .add(
///         FnPart::new(|_inputs: &[Option<Value>]| Ok(vec![Value::Float(0.5)])),
///         PartDescriptor::new("pilot").outputs(["pilot/throttle"]),
///     )
///     .unwrap();
///
/// let config = LoopConfig {
///     rate_hz: 1000.0,
///     max_loop_count: Some(3),
///     ..Default::default()
/// };
/// let summary = vehicle.start(&config).unwrap();
/// assert_eq!(summary.loop_count, 3);
/// assert_eq!(vehicle.bus().get_one("pilot/throttle"), Some(&Value::Float(0.5)));
/// ```
pub struct Vehicle {
    bus: Bus,
    parts: Vec<PartEntry>,
    running: RunFlag,
    started: bool,
    stopped: bool,
    shutdown_grace: Duration,
    profiler: PartProfiler,
    metrics: Arc<LoopMetrics>,
}

impl Vehicle {
    pub fn new() -> Self {
        Self::with_bus(Bus::new())
    }

    /// 使用预先填充的总线创建车辆（例如预置运行条件通道）
    pub fn with_bus(bus: Bus) -> Self {
        Self {
            bus,
            parts: Vec::new(),
            running: RunFlag::new(),
            started: false,
            stopped: false,
            shutdown_grace: LoopConfig::default().shutdown_grace,
            profiler: PartProfiler::new(),
            metrics: Arc::new(LoopMetrics::new()),
        }
    }

    /// 注册部件
    ///
    /// # 错误
    /// - `DriverError::AlreadyStarted`: 车辆已启动
    /// - `DriverError::InvalidDescriptor`: 描述符不合法，或声明了后台更新却没有提供 worker
    /// - `DriverError::DuplicatePart`: 部件名重复
    /// - `DriverError::DuplicateWriter`: 输出通道已被其他部件声明
    pub fn add<P: Part + 'static>(
        &mut self,
        part: P,
        descriptor: PartDescriptor,
    ) -> Result<(), DriverError> {
        self.add_boxed(Box::new(part), descriptor)
    }

    pub fn add_boxed(
        &mut self,
        mut part: Box<dyn Part>,
        descriptor: PartDescriptor,
    ) -> Result<(), DriverError> {
        if self.started || self.stopped {
            return Err(DriverError::AlreadyStarted);
        }
        descriptor.validate()?;

        if self.parts.iter().any(|e| e.descriptor.name == descriptor.name) {
            return Err(DriverError::DuplicatePart(descriptor.name));
        }
        for channel in &descriptor.outputs {
            if let Some(existing) = self
                .parts
                .iter()
                .find(|e| e.descriptor.outputs.contains(channel))
            {
                return Err(DriverError::DuplicateWriter {
                    channel: channel.clone(),
                    existing: existing.descriptor.name.clone(),
                    part: descriptor.name,
                });
            }
        }

        let worker = if descriptor.capabilities.background_update {
            match part.take_background() {
                Some(worker) => Some(worker),
                None => {
                    return Err(DriverError::InvalidDescriptor {
                        part: descriptor.name,
                        reason: "background_update declared but no worker provided".to_string(),
                    });
                },
            }
        } else {
            None
        };

        info!(
            "Adding part {} (inputs: {:?}, outputs: {:?})",
            descriptor.name, descriptor.inputs, descriptor.outputs
        );
        self.profiler.profile_part(descriptor.name.clone());
        self.parts.push(PartEntry {
            part,
            descriptor,
            worker,
            thread: None,
        });
        Ok(())
    }

    /// 移除部件（仅在启动前有效）
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Part>> {
        if self.started {
            return None;
        }
        let index = self.parts.iter().position(|e| e.descriptor.name == name)?;
        self.profiler.remove(index);
        let entry = self.parts.remove(index);
        debug!("Removed part {}", name);
        Some(entry.part)
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// 停止句柄：在其他线程（例如 Ctrl-C 处理器）调用 `stop()` 结束循环
    pub fn stop_handle(&self) -> RunFlag {
        self.running.clone()
    }

    pub fn metrics(&self) -> Arc<LoopMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn profiler(&self) -> &PartProfiler {
        &self.profiler
    }

    /// 按声明顺序的部件名
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|e| e.descriptor.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// 启动调度循环（阻塞）
    ///
    /// 启动所有后台线程，然后以 `rate_hz` 运行 tick 直到：
    /// - 达到 `max_loop_count`
    /// - 停止句柄被翻转
    /// - 部件返回致命错误
    ///
    /// 无论以何种方式结束，返回前都会调用 [`Vehicle::stop`]。
    pub fn start(&mut self, config: &LoopConfig) -> Result<LoopSummary, DriverError> {
        if !config.rate_hz.is_finite() || config.rate_hz <= 0.0 {
            return Err(DriverError::InvalidRate(format!(
                "rate_hz must be a positive finite number, got {}",
                config.rate_hz
            )));
        }
        if self.started || self.stopped {
            return Err(DriverError::AlreadyStarted);
        }
        self.started = true;
        self.shutdown_grace = config.shutdown_grace;

        if let Err(e) = self.spawn_workers() {
            self.stop();
            return Err(e);
        }

        #[cfg(feature = "realtime")]
        raise_thread_priority();

        let period = Duration::from_secs_f64(1.0 / config.rate_hz);
        info!(
            "Starting vehicle at {} Hz with {} parts",
            config.rate_hz,
            self.parts.len()
        );

        let loop_start = Instant::now();
        let mut loop_count: u64 = 0;
        let result = loop {
            if !self.running.is_running() {
                break Ok(());
            }
            let tick_start = Instant::now();
            loop_count += 1;

            if let Err(e) = self.update_parts() {
                error!("Drive loop aborted: {}", e);
                break Err(e);
            }

            if config.max_loop_count.is_some_and(|max| loop_count >= max) {
                break Ok(());
            }

            let elapsed = tick_start.elapsed();
            match period.checked_sub(elapsed) {
                Some(remaining) => spin_sleep::sleep(remaining),
                None => {
                    self.metrics.overruns.fetch_add(1, Ordering::Relaxed);
                    if config.verbose {
                        warn!(
                            "Jitter violation in vehicle loop with {:.0}ms",
                            (elapsed - period).as_secs_f64() * 1000.0
                        );
                    }
                },
            }

            if config.verbose
                && config.profile_interval > 0
                && loop_count % config.profile_interval == 0
            {
                self.profiler.report();
            }
        };

        let summary = LoopSummary {
            loop_count,
            elapsed: loop_start.elapsed(),
        };
        info!(
            "Vehicle executed {} steps in {:.3} seconds with {:.1} Hz average",
            summary.loop_count,
            summary.elapsed.as_secs_f64(),
            summary.effective_hz()
        );

        self.stop();
        result.map(|()| summary)
    }

    /// 执行一个 tick
    ///
    /// 瞬时错误和总线写入错误被记录并计数，调度继续；其他部件错误终止循环。
    pub fn update_parts(&mut self) -> Result<(), DriverError> {
        let Self {
            bus,
            parts,
            profiler,
            metrics,
            ..
        } = self;
        metrics.ticks.fetch_add(1, Ordering::Relaxed);

        for (index, entry) in parts.iter_mut().enumerate() {
            let descriptor = &entry.descriptor;

            if let Some(condition) = &descriptor.run_condition
                && !bus.get_one(condition).is_some_and(Value::is_truthy)
            {
                metrics.skipped_parts.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            let inputs: Inputs = descriptor
                .inputs
                .iter()
                .map(|name| bus.get_one(name).cloned())
                .collect();

            profiler.on_part_start(index);
            let result = if descriptor.capabilities.threaded_run {
                entry.part.run_threaded(&inputs)
            } else {
                entry.part.run(&inputs)
            };
            profiler.on_part_finished(index);

            match result {
                Ok(outputs) => {
                    if outputs.is_empty() || descriptor.outputs.is_empty() {
                        continue;
                    }
                    if let Err(e) = bus.put(&descriptor.outputs, outputs) {
                        metrics.part_errors.fetch_add(1, Ordering::Relaxed);
                        error!("Part {} produced unusable outputs: {}", descriptor.name, e);
                    }
                },
                Err(PartError::Transient(reason)) => {
                    metrics.part_errors.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        "Part {} dropped this tick after a transient error: {}",
                        descriptor.name, reason
                    );
                },
                Err(source) => {
                    metrics.part_errors.fetch_add(1, Ordering::Relaxed);
                    return Err(DriverError::Part {
                        part: descriptor.name.clone(),
                        source,
                    });
                },
            }
        }
        Ok(())
    }

    fn spawn_workers(&mut self) -> Result<(), DriverError> {
        for entry in &mut self.parts {
            if let Some(worker) = entry.worker.take() {
                let handle = spawn_worker(&entry.descriptor.name, worker, self.running.clone())?;
                entry.thread = Some(handle);
            }
        }
        Ok(())
    }

    /// 停止车辆
    ///
    /// 1. 翻转运行标志
    /// 2. 在宽限期内等待所有后台线程退出
    /// 3. 按声明顺序对声明了关闭能力的部件调用 `shutdown`（错误只记录，继续下一个）
    /// 4. 输出耗时报告
    ///
    /// 幂等：重复调用无效果。
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.running.stop();
        info!("Shutting down vehicle and its parts...");

        let deadline = Instant::now() + self.shutdown_grace;
        for entry in &mut self.parts {
            if let Some(handle) = entry.thread.take() {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if handle.join_timeout(remaining).is_err() {
                    error!(
                        "Worker thread of part {} panicked or did not exit within {:?}",
                        entry.descriptor.name, self.shutdown_grace
                    );
                }
            }
        }

        for entry in &mut self.parts {
            if !entry.descriptor.capabilities.shutdown {
                continue;
            }
            if let Err(e) = entry.part.shutdown() {
                error!("Failed to shut down part {}: {}", entry.descriptor.name, e);
            }
        }

        self.profiler.report();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Default for Vehicle {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Vehicle {
    fn drop(&mut self) {
        if self.started && !self.stopped {
            self.stop();
        }
    }
}

#[cfg(feature = "realtime")]
fn raise_thread_priority() {
    use thread_priority::{ThreadPriority, set_current_thread_priority};

    match set_current_thread_priority(ThreadPriority::Max) {
        Ok(()) => info!("Drive loop running with maximum thread priority"),
        Err(e) => warn!(
            "Failed to raise drive loop priority: {:?}. Real-time scheduling may require elevated privileges.",
            e
        ),
    }
}
