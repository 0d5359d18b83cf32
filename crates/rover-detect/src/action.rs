//! 动作约定
//!
//! 动作是由检测管理器驱动的多 tick 机动策略。动作被激活后，管理器每次检测都调用
//! `manage`，直到动作返回 `reset = true` 交还控制权。

use rover_tools::DemoConfig;
use tracing::debug;

/// 动作输出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionCommand {
    pub angle: f64,
    pub throttle: f64,
    /// 机动结束，管理器清除当前动作并立即恢复检测
    pub reset: bool,
}

impl ActionCommand {
    /// 原样透传并继续
    pub fn keep(angle: f64, throttle: f64) -> Self {
        Self {
            angle,
            throttle,
            reset: false,
        }
    }

    /// 原样透传并结束
    pub fn finish(angle: f64, throttle: f64) -> Self {
        Self {
            angle,
            throttle,
            reset: true,
        }
    }
}

/// 动作
///
/// - `found`：本次检测到的标签是否就是本动作的标签
/// - `position`：目标水平位置，`[-1, 1]`，负值表示在画面中心左侧
///
/// `found == false` 是正常的状态转移输入（目标已离开画面），不是错误。
pub trait Action: Send {
    /// 触发本动作的检测标签
    fn label(&self) -> &str;

    fn manage(&mut self, angle: f64, throttle: f64, found: bool, position: f64) -> ActionCommand;
}

/// 演示动作
///
/// 不修改控制量；连续处理 `trigger_times` 次或目标丢失时结束。
#[derive(Debug, Clone)]
pub struct DemoAction {
    label: String,
    trigger_times: u32,
    counter: u32,
}

impl DemoAction {
    pub fn new(label: impl Into<String>, trigger_times: u32) -> Self {
        Self {
            label: label.into(),
            trigger_times: trigger_times.max(1),
            counter: 0,
        }
    }

    pub fn from_config(config: &DemoConfig) -> Self {
        Self::new(config.label.clone(), config.trigger_times)
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }
}

impl Action for DemoAction {
    fn label(&self) -> &str {
        &self.label
    }

    fn manage(&mut self, angle: f64, throttle: f64, found: bool, _position: f64) -> ActionCommand {
        self.counter += 1;
        if !found || self.counter >= self.trigger_times {
            debug!("Demo action finished after {} ticks", self.counter);
            self.counter = 0;
            return ActionCommand::finish(angle, throttle);
        }
        ActionCommand::keep(angle, throttle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_resets_after_trigger_times() {
        let mut demo = DemoAction::new("person", 10);
        for _ in 0..9 {
            let cmd = demo.manage(0.1, 0.3, true, 0.0);
            assert!(!cmd.reset);
            assert_eq!((cmd.angle, cmd.throttle), (0.1, 0.3));
        }
        assert!(demo.manage(0.1, 0.3, true, 0.0).reset);
        assert_eq!(demo.counter(), 0);
    }

    #[test]
    fn test_demo_resets_when_lost() {
        let mut demo = DemoAction::from_config(&DemoConfig::default());
        assert!(!demo.manage(0.0, 0.0, true, 0.0).reset);
        assert!(demo.manage(0.0, 0.0, false, 0.0).reset);
        assert_eq!(demo.counter(), 0);
    }
}
