//! 检测器约定

use crate::error::DetectError;
use rover_bus::{BoundingBox, ImageFrame};
use std::time::Duration;

/// 单个检测结果
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub bbox: BoundingBox,
    pub score: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, bbox: BoundingBox, score: f32) -> Self {
        Self {
            label: label.into(),
            bbox,
            score,
        }
    }
}

/// 外部检测器
///
/// 实现方负责模型加载与推理，返回的结果顺序不限；管理器会按置信度排序。
/// 任意 `FnMut(&ImageFrame) -> Result<Vec<Detection>, DetectError>` 闭包都可作为检测器。
pub trait Detector: Send {
    fn detect(&mut self, image: &ImageFrame) -> Result<Vec<Detection>, DetectError>;
}

impl<F> Detector for F
where
    F: FnMut(&ImageFrame) -> Result<Vec<Detection>, DetectError> + Send,
{
    fn detect(&mut self, image: &ImageFrame) -> Result<Vec<Detection>, DetectError> {
        self(image)
    }
}

/// 检测耗时统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionStats {
    /// 成功运行次数
    pub runs: u64,
    /// 失败次数
    pub failures: u64,
    /// 成功运行的累计耗时
    pub total: Duration,
}

impl DetectionStats {
    pub fn record(&mut self, elapsed: Duration) {
        self.runs += 1;
        self.total += elapsed;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// 平均检测耗时，没有成功运行时返回 `None`
    pub fn average(&self) -> Option<Duration> {
        if self.runs == 0 {
            return None;
        }
        Some(self.total.div_f64(self.runs as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_detector() {
        let mut detector = |_: &ImageFrame| -> Result<Vec<Detection>, DetectError> {
            Ok(vec![Detection::new("cone", BoundingBox::new(0, 0, 10, 10), 0.9)])
        };
        let results = detector.detect(&ImageFrame::new(16, 16)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "cone");
    }

    #[test]
    fn test_detection_stats_average() {
        let mut stats = DetectionStats::default();
        assert_eq!(stats.average(), None);
        stats.record(Duration::from_millis(80));
        stats.record(Duration::from_millis(120));
        stats.record_failure();
        let average = stats.average().unwrap();
        assert!((average.as_secs_f64() - 0.1).abs() < 1e-6);
        assert_eq!(stats.failures, 1);
    }
}
