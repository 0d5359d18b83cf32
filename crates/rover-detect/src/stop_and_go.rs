//! 停车-通行机动
//!
//! 有传动惯性的车辆无法靠单纯的零油门立即停下。`StopManager` 发出一段短暂的反向脉冲、
//! 一个空档间隔、第二段反向脉冲，然后把油门逐步回升到零，近似一次受控停车。
//!
//! `StopAndGoAction` 在外层按 `Running → Stopping → Pausing → Passing → Running` 推进：
//! 首次检测到目标时停车，停稳后原地等待 `pause`，然后恢复驾驶员油门直到目标离开画面。

use crate::action::{Action, ActionCommand};
use rover_tools::StopAndGoConfig;
use std::time::{Duration, Instant};
use tracing::debug;

/// 停车过程中回升阶段每次增加的油门
pub const THROTTLE_INC: f64 = 0.2;

/// 停车状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopState {
    #[default]
    Idle,
    Initiate,
    NegOne,
    PosOne,
    NegTwo,
}

/// 停车状态机
///
/// 每次调用 `throttle()` 推进一步：
///
/// | 状态 | 输出 | 下一状态 |
/// |------|------|----------|
/// | Idle | 0.0 | Idle（仅 `stop()` 可离开） |
/// | Initiate | -1.0 | NegOne |
/// | NegOne | 0.0 | PosOne |
/// | PosOne | -1.0 | NegTwo |
/// | NegTwo | 上次油门 + 0.2，≥ 0 时置为 0.0 | 置零时回到 Idle |
#[derive(Debug, Clone, Default)]
pub struct StopManager {
    state: StopState,
    last_throttle: f64,
}

impl StopManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始停车（仅在空闲时有效）
    pub fn stop(&mut self) {
        if self.state == StopState::Idle {
            self.state = StopState::Initiate;
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == StopState::Idle
    }

    pub fn state(&self) -> StopState {
        self.state
    }

    pub fn throttle(&mut self) -> f64 {
        let throttle = match self.state {
            StopState::Idle => 0.0,
            StopState::Initiate => {
                self.state = StopState::NegOne;
                -1.0
            },
            StopState::NegOne => {
                self.state = StopState::PosOne;
                0.0
            },
            StopState::PosOne => {
                self.state = StopState::NegTwo;
                -1.0
            },
            StopState::NegTwo => {
                let next = self.last_throttle + THROTTLE_INC;
                if next >= 0.0 {
                    self.state = StopState::Idle;
                    0.0
                } else {
                    next
                }
            },
        };
        self.last_throttle = throttle;
        throttle
    }
}

/// 停车-通行外层状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GoState {
    #[default]
    Running,
    Stopping,
    Pausing,
    Passing,
}

/// 停车-通行动作
#[derive(Debug, Clone)]
pub struct StopAndGoAction {
    label: String,
    pause: Duration,
    state: GoState,
    // None 表示等待时间超出可表示范围，一直等待
    deadline: Option<Instant>,
    stopper: StopManager,
}

impl StopAndGoAction {
    pub fn new(label: impl Into<String>, pause: Duration) -> Self {
        Self {
            label: label.into(),
            pause,
            state: GoState::Running,
            deadline: None,
            stopper: StopManager::new(),
        }
    }

    pub fn from_config(config: &StopAndGoConfig) -> Self {
        Self::new(config.label.clone(), config.pause_time())
    }

    pub fn state(&self) -> GoState {
        self.state
    }

    pub fn stopper(&self) -> &StopManager {
        &self.stopper
    }
}

impl Action for StopAndGoAction {
    fn label(&self) -> &str {
        &self.label
    }

    fn manage(&mut self, angle: f64, throttle: f64, found: bool, _position: f64) -> ActionCommand {
        let mut throttle = throttle;
        let mut reset = false;

        if self.state == GoState::Running {
            if found {
                debug!("Stop target '{}' detected, stopping", self.label);
                self.state = GoState::Stopping;
                self.stopper.stop();
            } else {
                reset = true;
            }
        }

        match self.state {
            GoState::Stopping => {
                throttle = self.stopper.throttle();
                if self.stopper.is_idle() {
                    self.state = GoState::Pausing;
                    self.deadline = Instant::now().checked_add(self.pause);
                }
            },
            GoState::Pausing => {
                let waiting = self.deadline.is_none_or(|deadline| Instant::now() < deadline);
                if waiting {
                    throttle = 0.0;
                } else {
                    debug!("Pause finished, passing '{}'", self.label);
                    self.state = GoState::Passing;
                }
            },
            GoState::Passing => {
                if !found {
                    self.state = GoState::Running;
                    reset = true;
                }
            },
            GoState::Running => {},
        }

        ActionCommand {
            angle,
            throttle,
            reset,
        }
    }
}
