//! 调度循环指标
//!
//! 原子计数器，调度线程更新，任意线程读取快照，不引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 调度循环实时指标
///
/// # 使用示例
///
/// ```rust
/// use rover_driver::LoopMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = LoopMetrics::new();
/// metrics.ticks.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(metrics.snapshot().ticks, 1);
/// ```
#[derive(Debug, Default)]
pub struct LoopMetrics {
    /// 已执行的 tick 数
    pub ticks: AtomicU64,

    /// 超出周期的 tick 数（抖动）
    ///
    /// 持续增长说明部件总耗时超过了循环周期，需要降低频率或优化部件。
    pub overruns: AtomicU64,

    /// 部件错误次数（瞬时错误、总线写入错误、致命错误）
    pub part_errors: AtomicU64,

    /// 因运行条件为假而跳过的部件调用次数
    pub skipped_parts: AtomicU64,
}

impl LoopMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取指标快照（`Ordering::Relaxed`，计数器之间可能有微小时间差）
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        LoopMetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            part_errors: self.part_errors.load(Ordering::Relaxed),
            skipped_parts: self.skipped_parts.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Relaxed);
        self.overruns.store(0, Ordering::Relaxed);
        self.part_errors.store(0, Ordering::Relaxed);
        self.skipped_parts.store(0, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopMetricsSnapshot {
    pub ticks: u64,
    pub overruns: u64,
    pub part_errors: u64,
    pub skipped_parts: u64,
}

impl LoopMetricsSnapshot {
    /// 超时 tick 占比（百分比），`ticks` 为 0 时返回 0.0
    pub fn overrun_rate(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        (self.overruns as f64 / self.ticks as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_metrics_increment_and_reset() {
        let metrics = LoopMetrics::new();
        metrics.ticks.fetch_add(10, Ordering::Relaxed);
        metrics.overruns.fetch_add(2, Ordering::Relaxed);
        metrics.skipped_parts.fetch_add(3, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks, 10);
        assert_eq!(snapshot.overruns, 2);
        assert_eq!(snapshot.skipped_parts, 3);
        assert_eq!(snapshot.overrun_rate(), 20.0);

        metrics.reset();
        assert_eq!(metrics.snapshot(), LoopMetricsSnapshot::default());
    }

    #[test]
    fn test_metrics_concurrent_reads() {
        let metrics = Arc::new(LoopMetrics::new());
        let reader = {
            let m = metrics.clone();
            thread::spawn(move || {
                let mut last = 0;
                for _ in 0..1000 {
                    let now = m.snapshot().ticks;
                    assert!(now >= last);
                    last = now;
                }
            })
        };
        for _ in 0..1000 {
            metrics.ticks.fetch_add(1, Ordering::Relaxed);
        }
        reader.join().unwrap();
        assert_eq!(metrics.snapshot().ticks, 1000);
    }

    #[test]
    fn test_overrun_rate_zero_ticks() {
        assert_eq!(LoopMetricsSnapshot::default().overrun_rate(), 0.0);
    }
}
