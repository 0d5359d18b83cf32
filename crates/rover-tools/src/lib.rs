//! # Rover Tools - 共享配置和统计
//!
//! **依赖原则**: 不依赖其他 rover crate，只包含纯数据结构和纯函数
//!
//! ## 包含模块
//!
//! - `config` - 车辆配置（TOML，只读结构 + 校验）
//! - `statistics` - 耗时统计（百分位数，纯函数）

pub mod config;
pub mod statistics;

// 重新导出常用类型
pub use config::{
    ConfigError, DemoConfig, DetectorConfig, DriveConfig, PassObjectConfig, StopAndGoConfig,
    VehicleConfig,
};
pub use statistics::{TimingSummary, percentile};
