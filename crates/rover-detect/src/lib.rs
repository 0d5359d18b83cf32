//! 目标检测层模块
//!
//! 本模块在驱动层之上提供基于目标检测的机动控制，包括：
//! - `Detector`：外部检测器约定（图像 → 标签 / 检测框 / 置信度）
//! - `DetectorManager`：按分频运行检测、计算目标位置、把控制权分派给已注册的动作
//! - `Action`：多 tick 机动策略约定
//! - 内置动作：停车-通行（`StopAndGoAction`）、绕行（`PassObjectAction`）、演示（`DemoAction`）
//! - 诊断叠加（在图像上标记检测框）

pub mod action;
mod detector;
mod error;
mod manager;
pub mod overlay;
pub mod pass_object;
pub mod stop_and_go;

pub use action::{Action, ActionCommand, DemoAction};
pub use detector::{Detection, DetectionStats, Detector};
pub use error::DetectError;
pub use manager::{DetectorManager, StepOutput};
pub use pass_object::PassObjectAction;
pub use stop_and_go::{GoState, StopAndGoAction, StopManager, StopState};
