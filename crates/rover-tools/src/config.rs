//! # 车辆配置
//!
//! 驱动循环、目标检测与机动策略的配置项。所有字段都有默认值，配置文件
//! 只需写出需要覆盖的部分：
//!
//! ```toml
//! [drive]
//! vehicle_hz = 20.0
//!
//! [detector]
//! run_hz = 1.0
//! image_width = 160
//!
//! [detector.score_thresholds]
//! "stop sign" = 0.6
//!
//! [stop_and_go]
//! enabled = true
//! pause_time_s = 2.0
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读写配置文件失败
    #[error("Failed to access config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML 序列化失败
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 配置值不合法
    #[error("Invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// 车辆配置（顶层）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// 驱动循环
    pub drive: DriveConfig,
    /// 目标检测
    pub detector: DetectorConfig,
    /// 停车-通行机动
    pub stop_and_go: StopAndGoConfig,
    /// 绕行机动
    pub pass_object: PassObjectConfig,
    /// 演示动作
    pub demo: DemoConfig,
}

/// 驱动循环配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// 主循环频率（Hz）
    pub vehicle_hz: f64,
    /// 最大循环次数（`None` 表示一直运行直到停止）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_loops: Option<u64>,
    /// 输出抖动告警和周期性性能报告
    pub verbose: bool,
    /// 停止时等待后台线程退出的宽限期（毫秒）
    pub shutdown_grace_ms: u64,
    /// verbose 模式下每隔多少次循环输出一次性能报告（0 表示不输出）
    pub profile_interval: u64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            vehicle_hz: 20.0,
            max_loops: None,
            verbose: false,
            shutdown_grace_ms: 300,
            profile_interval: 200,
        }
    }
}

impl DriveConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// 目标检测配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// 检测频率（Hz），实际按 `vehicle_hz / run_hz` 分频执行
    pub run_hz: f64,
    /// 图像宽度（像素）
    pub image_width: u32,
    /// 在图像上绘制检测框
    pub show_bounding_box: bool,
    /// 默认置信度阈值
    pub default_score: f32,
    /// 每帧最多考虑的检测结果数
    pub max_results: usize,
    /// 按标签覆盖的置信度阈值
    pub score_thresholds: BTreeMap<String, f32>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            run_hz: 1.0,
            image_width: 160,
            show_bounding_box: true,
            default_score: 0.5,
            max_results: 3,
            score_thresholds: BTreeMap::new(),
        }
    }
}

impl DetectorConfig {
    /// 指定标签的置信度阈值
    pub fn threshold_for(&self, label: &str) -> f32 {
        self.score_thresholds
            .get(label)
            .copied()
            .unwrap_or(self.default_score)
    }
}

/// 停车-通行配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopAndGoConfig {
    pub enabled: bool,
    pub label: String,
    /// 停稳后的等待时间（秒）
    pub pause_time_s: f64,
}

impl Default for StopAndGoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            label: "stop sign".to_string(),
            pause_time_s: 2.0,
        }
    }
}

impl StopAndGoConfig {
    pub fn pause_time(&self) -> Duration {
        Duration::try_from_secs_f64(self.pause_time_s).unwrap_or(Duration::ZERO)
    }
}

/// 绕行配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassObjectConfig {
    pub enabled: bool,
    pub label: String,
    /// 绕行期间的油门倍率
    pub speedup_multiplier: f64,
    /// 与目标保持的横向余量（归一化位置单位）
    pub tolerance: f64,
    /// 最大转向角（归一化）
    pub max_angle: f64,
}

impl Default for PassObjectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            label: "cone".to_string(),
            speedup_multiplier: 1.0,
            tolerance: 0.25,
            max_angle: 0.75,
        }
    }
}

/// 演示动作配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub enabled: bool,
    pub label: String,
    /// 连续处理多少次后结束
    pub trigger_times: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            label: "person".to_string(),
            trigger_times: 10,
        }
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, format!("must be > 0, got {value}")));
    }
    Ok(())
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, format!("must be >= 0, got {value}")));
    }
    Ok(())
}

fn check_score(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, format!("must be within [0, 1], got {value}")));
    }
    Ok(())
}

impl VehicleConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: VehicleConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载并校验
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 已启用动作的标签
    pub fn enabled_labels(&self) -> Vec<&str> {
        let mut labels = Vec::new();
        if self.stop_and_go.enabled {
            labels.push(self.stop_and_go.label.as_str());
        }
        if self.pass_object.enabled {
            labels.push(self.pass_object.label.as_str());
        }
        if self.demo.enabled {
            labels.push(self.demo.label.as_str());
        }
        labels
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("drive.vehicle_hz", self.drive.vehicle_hz)?;
        if self.drive.max_loops == Some(0) {
            return Err(invalid("drive.max_loops", "must be >= 1 when set"));
        }

        let detector = &self.detector;
        check_positive("detector.run_hz", detector.run_hz)?;
        if detector.run_hz > self.drive.vehicle_hz {
            warn!(
                "detector.run_hz ({}) exceeds drive.vehicle_hz ({}), detection runs every tick",
                detector.run_hz, self.drive.vehicle_hz
            );
        }
        if detector.image_width == 0 {
            return Err(invalid("detector.image_width", "must be > 0"));
        }
        if detector.max_results == 0 {
            return Err(invalid("detector.max_results", "must be >= 1"));
        }
        check_score("detector.default_score", detector.default_score)?;
        for score in detector.score_thresholds.values() {
            check_score("detector.score_thresholds", *score)?;
        }

        check_non_negative("stop_and_go.pause_time_s", self.stop_and_go.pause_time_s)?;

        let pass = &self.pass_object;
        check_non_negative("pass_object.tolerance", pass.tolerance)?;
        check_non_negative("pass_object.speedup_multiplier", pass.speedup_multiplier)?;
        if !pass.max_angle.is_finite() || pass.max_angle <= 0.0 || pass.max_angle > 1.0 {
            return Err(invalid(
                "pass_object.max_angle",
                format!("must be within (0, 1], got {}", pass.max_angle),
            ));
        }

        if self.demo.trigger_times == 0 {
            return Err(invalid("demo.trigger_times", "must be >= 1"));
        }

        let labels = self.enabled_labels();
        for (i, label) in labels.iter().enumerate() {
            if label.is_empty() {
                return Err(invalid("label", "action label must not be empty"));
            }
            if labels[..i].contains(label) {
                return Err(invalid(
                    "label",
                    format!("label '{label}' is used by more than one enabled action"),
                ));
            }
        }
        Ok(())
    }
}
