//! 检测层错误类型定义

use rover_driver::DriverError;
use rover_tools::ConfigError;
use thiserror::Error;

/// 检测层错误类型
#[derive(Error, Debug)]
pub enum DetectError {
    /// 检测器后端失败（模型推理错误、图像格式不支持等）
    #[error("Detector failed: {0}")]
    Backend(String),

    /// 同一标签重复注册动作
    #[error("Action for label '{0}' is already registered")]
    DuplicateAction(String),

    /// 动作标签为空
    #[error("Action label must not be empty")]
    EmptyLabel,

    /// 驱动层错误（分频参数不合法等）
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_error_display() {
        assert_eq!(
            format!("{}", DetectError::DuplicateAction("cone".to_string())),
            "Action for label 'cone' is already registered"
        );
        let err: DetectError = DriverError::InvalidRate("run_hz must be positive".to_string()).into();
        assert!(format!("{}", err).contains("run_hz"));
    }
}
