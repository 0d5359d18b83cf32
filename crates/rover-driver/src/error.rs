//! 驱动层错误类型定义

use crate::part::Capability;
use rover_bus::BusError;
use thiserror::Error;

/// 部件运行错误
///
/// - `Transient`：本 tick 的读数被丢弃，部件保留上一次的有效状态，调度继续
/// - `Fatal`：调度循环终止，车辆停止
#[derive(Error, Debug)]
pub enum PartError {
    /// 瞬时错误（串口抖动、传感器数据格式错误、检测失败等）
    #[error("Transient error: {0}")]
    Transient(String),

    /// 不可恢复错误
    #[error("Fatal error: {0}")]
    Fatal(String),

    /// 调用了部件未实现的能力
    #[error("Capability not implemented: {0}")]
    Unsupported(Capability),

    /// 释放资源失败
    #[error("Shutdown failed: {0}")]
    Shutdown(String),
}

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 总线错误
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// 部件运行失败
    #[error("Part '{part}' failed: {source}")]
    Part {
        part: String,
        #[source]
        source: PartError,
    },

    /// 部件描述符不合法
    #[error("Invalid descriptor for part '{part}': {reason}")]
    InvalidDescriptor { part: String, reason: String },

    /// 两个部件声明写同一个通道
    #[error("Channel '{channel}' is already written by part '{existing}', rejected for part '{part}'")]
    DuplicateWriter {
        channel: String,
        existing: String,
        part: String,
    },

    /// 部件名重复
    #[error("Part '{0}' is already registered")]
    DuplicatePart(String),

    /// 频率参数不合法
    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    /// 车辆已启动或已停止
    #[error("Vehicle has already been started or stopped")]
    AlreadyStarted,

    /// 无法创建后台线程
    #[error("Failed to spawn worker thread for part '{part}': {source}")]
    WorkerSpawn {
        part: String,
        #[source]
        source: std::io::Error,
    },
}
