//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use rover_sdk::prelude::*;
//! ```

// 总线层
pub use rover_bus::{BoundingBox, Bus, ChannelSchema, ImageFrame, Value};

// 驱动层
pub use rover_driver::{
    BackgroundUpdate, Capabilities, FnPart, LoopConfig, LoopSummary, Outputs, Part,
    PartDescriptor, RateDivider, RunFlag, SnapshotCell, ThreadedPart, Vehicle,
};

// 检测层
pub use rover_detect::{
    Action, ActionCommand, DemoAction, Detection, Detector, DetectorManager, PassObjectAction,
    StopAndGoAction, StopManager,
};

// 配置
pub use rover_tools::VehicleConfig;

// 错误类型
pub use crate::SdkError;
pub use rover_bus::BusError;
pub use rover_detect::DetectError;
pub use rover_driver::{DriverError, PartError};
pub use rover_tools::ConfigError;
