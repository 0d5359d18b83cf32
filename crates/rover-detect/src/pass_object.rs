//! 绕行机动
//!
//! 检测到障碍物（例如锥桶）时，让转向角与障碍物位置至少保持 `tolerance` 的横向余量，
//! 同时按 `speedup_multiplier` 调整油门。目标离开画面时结束。

use crate::action::{Action, ActionCommand};
use rover_tools::PassObjectConfig;

/// 绕行动作
#[derive(Debug, Clone)]
pub struct PassObjectAction {
    label: String,
    speedup: f64,
    tolerance: f64,
    max_angle: f64,
}

impl PassObjectAction {
    pub fn new(label: impl Into<String>, speedup: f64, tolerance: f64, max_angle: f64) -> Self {
        Self {
            label: label.into(),
            speedup,
            tolerance,
            max_angle,
        }
    }

    pub fn from_config(config: &PassObjectConfig) -> Self {
        Self::new(
            config.label.clone(),
            config.speedup_multiplier,
            config.tolerance,
            config.max_angle,
        )
    }

    /// 计算避让后的转向角
    ///
    /// 转向角不小于障碍物位置时，向右至少偏到 `position + tolerance`；若超过
    /// `max_angle`，则在原角度已留出余量时保持原角度，否则改从左侧绕行。
    /// 转向角小于障碍物位置时对称处理。
    pub fn avoid(&self, angle: f64, position: f64) -> f64 {
        let cone_tol = position + self.tolerance;
        let cone_tol_neg = position - self.tolerance;

        if angle >= position {
            if cone_tol <= self.max_angle {
                angle.max(cone_tol)
            } else if cone_tol <= angle {
                angle
            } else {
                cone_tol_neg
            }
        } else if cone_tol_neg >= -self.max_angle {
            angle.min(cone_tol_neg)
        } else if cone_tol_neg >= angle {
            angle
        } else {
            cone_tol
        }
    }
}

impl Action for PassObjectAction {
    fn label(&self) -> &str {
        &self.label
    }

    fn manage(&mut self, angle: f64, throttle: f64, found: bool, position: f64) -> ActionCommand {
        if !found {
            return ActionCommand::finish(angle, throttle);
        }
        ActionCommand::keep(self.avoid(angle, position), throttle * self.speedup)
    }
}
