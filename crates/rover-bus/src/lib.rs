//! 数据总线层模块
//!
//! 本模块提供车辆各部件（Part）之间共享数据的通道总线，包括：
//! - `Bus`：按通道名存取的共享键值存储（最新值覆盖语义，不保留历史）
//! - `Value`：通道上传递的动态类型值
//! - `ImageFrame`：相机图像缓冲（支持诊断叠加标注）
//! - `ChannelSchema`：生产者声明的通道集合（拒绝未声明的键）
//!
//! # 并发约定
//!
//! `Bus` 本身不加锁，只由调度线程访问。每个通道在每个 tick 内只允许一个
//! 部件写入，该约束在组装阶段由调度器检查。

mod bus;
mod error;
pub mod image;
pub mod schema;
mod value;

pub use bus::Bus;
pub use error::BusError;
pub use image::{Annotation, BoundingBox, ImageFrame};
pub use schema::ChannelSchema;
pub use value::Value;
