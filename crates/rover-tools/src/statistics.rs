//! # 统计工具
//!
//! 部件耗时统计（最大/最小/平均/百分位数），供驱动循环的性能报告使用。

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 百分位数（线性插值）
///
/// `sorted` 必须已升序排列；`pct` 取值 `[0, 100]`。空输入返回 0。
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pct = pct.clamp(0.0, 100.0);
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// 耗时统计（单位：毫秒）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSummary {
    /// 样本数量
    pub samples: usize,
    pub max_ms: f64,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p99_ms: f64,
    pub p999_ms: f64,
}

impl TimingSummary {
    /// 计算耗时统计，空输入返回 `None`
    pub fn from_durations(durations: &[Duration]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }
        let mut ms: Vec<f64> = durations.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        ms.sort_by(f64::total_cmp);

        let sum: f64 = ms.iter().sum();
        Some(Self {
            samples: ms.len(),
            max_ms: ms[ms.len() - 1],
            min_ms: ms[0],
            avg_ms: sum / ms.len() as f64,
            p50_ms: percentile(&ms, 50.0),
            p90_ms: percentile(&ms, 90.0),
            p99_ms: percentile(&ms, 99.0),
            p999_ms: percentile(&ms, 99.9),
        })
    }
}
