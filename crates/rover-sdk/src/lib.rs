//! Rover SDK - 定频驾驶循环 Rust SDK
//!
//! 把传感器、驾驶员、目标检测和执行器组织成按固定频率运行的部件流水线。
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **总线层** (`bus`): 通道总线、动态值、图像帧、通道声明
//! - **工具层** (`tools`): TOML 配置、耗时统计
//! - **驱动层** (`driver`): 部件约定、调度循环、后台线程、快照、分频器
//! - **检测层** (`detect`): 检测管理器与机动状态机
//!
//! # 快速开始
//!
//! ```rust
//! use rover_sdk::prelude::*;
//!
//! let mut vehicle = Vehicle::new();
//! vehicle
//!     .add(
//!         FnPart::new(|_inputs: &[Option<Value>]| Ok(vec![Value::Float(0.25)])),
//!         PartDescriptor::new("pilot").outputs(["pilot/throttle"]),
//!     )
//!     .unwrap();
//! vehicle
//!     .start(&LoopConfig { rate_hz: 500.0, max_loop_count: Some(2), ..Default::default() })
//!     .unwrap();
//! ```

pub mod logging;
pub mod prelude;
pub mod sim;

pub use rover_bus as bus;
pub use rover_detect as detect;
pub use rover_driver as driver;
pub use rover_tools as tools;

// 常用类型
pub use rover_bus::{Bus, BusError, ImageFrame, Value};
pub use rover_detect::{DetectError, DetectorManager};
pub use rover_driver::{DriverError, LoopConfig, Part, PartDescriptor, PartError, Vehicle};
pub use rover_tools::{ConfigError, VehicleConfig};

pub use logging::{init_logger, init_logger_with};

use thiserror::Error;

/// SDK 顶层错误类型
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Detect error: {0}")]
    Detect(#[from] DetectError),
}
