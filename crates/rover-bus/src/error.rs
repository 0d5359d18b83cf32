//! 总线层错误类型定义

use thiserror::Error;

/// 总线错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// 通道名数量与值数量不一致
    #[error("Arity mismatch: {names} channel names but {values} values")]
    Arity { names: usize, values: usize },

    /// 生产者写入了未在其 schema 中声明的通道
    #[error("Producer '{producer}' has no declared channel '{channel}'")]
    UnknownChannel { producer: String, channel: String },

    /// 空通道名
    #[error("Channel name must not be empty")]
    EmptyChannelName,

    /// schema 中重复声明的通道
    #[error("Channel '{0}' declared more than once")]
    DuplicateChannel(String),

    /// 图像缓冲长度与尺寸不符
    #[error("Invalid image buffer: expected {expected} bytes, got {actual}")]
    InvalidImage { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::BusError;

    #[test]
    fn test_bus_error_display() {
        let err = BusError::Arity {
            names: 2,
            values: 3,
        };
        assert_eq!(format!("{}", err), "Arity mismatch: 2 channel names but 3 values");

        let err = BusError::UnknownChannel {
            producer: "imu".to_string(),
            channel: "acc_w".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("imu") && msg.contains("acc_w"));

        assert_eq!(
            format!("{}", BusError::EmptyChannelName),
            "Channel name must not be empty"
        );
    }
}
