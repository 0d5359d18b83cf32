//! 部件耗时剖析
//!
//! 记录每个部件每次调用的耗时，按需输出最大/最小/平均及 50/90/99/99.9 百分位数。
//! 统计时丢弃第一个和最后一个样本（首次调用通常包含初始化开销，最后一次可能被停止打断）。

use rover_tools::TimingSummary;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::info;

/// 每个部件保留的最大样本数
const MAX_SAMPLES: usize = 4096;

#[derive(Debug)]
struct PartTimes {
    name: String,
    samples: VecDeque<Duration>,
    started: Option<Instant>,
}

/// 部件耗时剖析器
///
/// 记录按部件注册顺序存放，索引与调度器中的部件顺序一致。
#[derive(Debug, Default)]
pub struct PartProfiler {
    records: Vec<PartTimes>,
}

impl PartProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册部件，返回其索引
    pub fn profile_part(&mut self, name: impl Into<String>) -> usize {
        self.records.push(PartTimes {
            name: name.into(),
            samples: VecDeque::new(),
            started: None,
        });
        self.records.len() - 1
    }

    /// 移除部件（后续部件的索引前移）
    pub fn remove(&mut self, index: usize) {
        if index < self.records.len() {
            self.records.remove(index);
        }
    }

    pub fn on_part_start(&mut self, index: usize) {
        if let Some(record) = self.records.get_mut(index) {
            record.started = Some(Instant::now());
        }
    }

    pub fn on_part_finished(&mut self, index: usize) {
        let started = self.records.get_mut(index).and_then(|r| r.started.take());
        if let Some(started) = started {
            self.record(index, started.elapsed());
        }
    }

    /// 直接记录一个样本
    pub fn record(&mut self, index: usize, elapsed: Duration) {
        if let Some(record) = self.records.get_mut(index) {
            if record.samples.len() == MAX_SAMPLES {
                record.samples.pop_front();
            }
            record.samples.push_back(elapsed);
        }
    }

    /// 各部件耗时统计
    ///
    /// 去掉首尾样本后没有剩余样本的部件不出现在结果中。
    pub fn summaries(&self) -> Vec<(String, TimingSummary)> {
        self.records
            .iter()
            .filter_map(|record| {
                let samples: Vec<Duration> = record.samples.iter().copied().collect();
                let trimmed = match samples.len() {
                    0..=2 => return None,
                    n => &samples[1..n - 1],
                };
                TimingSummary::from_durations(trimmed).map(|s| (record.name.clone(), s))
            })
            .collect()
    }

    /// 输出耗时报告（info 级别）
    pub fn report(&self) {
        let summaries = self.summaries();
        if summaries.is_empty() {
            return;
        }

        info!("Part Profile Summary: (times in ms)");
        info!(
            "{:<28} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
            "part", "max", "min", "avg", "50%", "90%", "99%", "99.9%"
        );
        for (name, s) in summaries {
            info!(
                "{:<28} {:>9.2} {:>9.2} {:>9.2} {:>9.2} {:>9.2} {:>9.2} {:>9.2}",
                name, s.max_ms, s.min_ms, s.avg_ms, s.p50_ms, s.p90_ms, s.p99_ms, s.p999_ms
            );
        }
    }
}
