//! 分频器
//!
//! 在定频调度循环中，让开销较大的工作（例如目标检测）只在每 N 个 tick 执行一次，
//! `N = max(1, floor(vehicle_hz / run_hz))`。

use crate::error::DriverError;

/// 分频器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateDivider {
    run_trigger: u64,
    counter: u64,
}

impl RateDivider {
    /// 创建分频器
    ///
    /// # 错误
    /// 两个频率都必须是正的有限值，否则返回 `DriverError::InvalidRate`。
    pub fn new(vehicle_hz: f64, run_hz: f64) -> Result<Self, DriverError> {
        for (name, hz) in [("vehicle_hz", vehicle_hz), ("run_hz", run_hz)] {
            if !hz.is_finite() || hz <= 0.0 {
                return Err(DriverError::InvalidRate(format!(
                    "{} must be a positive finite number, got {}",
                    name, hz
                )));
            }
        }
        let run_trigger = ((vehicle_hz / run_hz).floor() as u64).max(1);
        Ok(Self {
            run_trigger,
            counter: 0,
        })
    }

    /// 每 `n` 个 tick 触发一次
    pub fn every(n: u64) -> Self {
        Self {
            run_trigger: n.max(1),
            counter: 0,
        }
    }

    /// 计数一次，到达触发点时返回 `true` 并清零
    pub fn tick(&mut self) -> bool {
        let fire = self.advance();
        if fire {
            self.counter = 0;
        }
        fire
    }

    /// 计数一次，到达触发点时返回 `true`，不清零
    ///
    /// 由调用方决定何时 `reset` 或 `arm`。
    pub fn advance(&mut self) -> bool {
        self.counter += 1;
        self.counter >= self.run_trigger
    }

    /// 清零：下一次触发在 `run_trigger` 个 tick 之后
    pub fn reset(&mut self) {
        self.counter = 0;
    }

    /// 预置：下一个 tick 立即触发
    pub fn arm(&mut self) {
        self.counter = self.run_trigger - 1;
    }

    pub fn run_trigger(&self) -> u64 {
        self.run_trigger
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_from_rates() {
        assert_eq!(RateDivider::new(20.0, 1.0).unwrap().run_trigger(), 20);
        assert_eq!(RateDivider::new(20.0, 3.0).unwrap().run_trigger(), 6);
        // 检测频率高于车辆频率时每个 tick 都运行
        assert_eq!(RateDivider::new(10.0, 50.0).unwrap().run_trigger(), 1);
    }

    #[test]
    fn test_invalid_rates() {
        assert!(matches!(
            RateDivider::new(0.0, 1.0),
            Err(DriverError::InvalidRate(_))
        ));
        assert!(RateDivider::new(20.0, -1.0).is_err());
        assert!(RateDivider::new(f64::NAN, 1.0).is_err());
        assert!(RateDivider::new(20.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_fires_every_nth_tick() {
        let mut divider = RateDivider::new(20.0, 1.0).unwrap();
        let fired: Vec<usize> = (1..=60).filter(|_| divider.tick()).collect();
        assert_eq!(fired, vec![20, 40, 60]);
    }

    #[test]
    fn test_advance_keeps_firing_until_reset() {
        let mut divider = RateDivider::every(3);
        assert!(!divider.advance());
        assert!(!divider.advance());
        assert!(divider.advance());
        assert!(divider.advance());
        divider.reset();
        assert!(!divider.advance());
    }

    #[test]
    fn test_arm_fires_on_next_tick() {
        let mut divider = RateDivider::every(20);
        divider.arm();
        assert!(divider.advance());

        let mut single = RateDivider::every(1);
        single.arm();
        assert_eq!(single.counter(), 0);
        assert!(single.tick());
    }
}
