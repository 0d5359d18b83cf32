//! 通道声明（Channel Schema）
//!
//! 批量写入总线的生产者（例如把遥测字典展开到多个通道的部件）必须预先
//! 声明允许写入的键集合。未声明的键在写入前整体拒绝，而不是在运行时
//! 动态生成新通道。

use crate::error::BusError;
use std::collections::BTreeSet;

/// 生产者通道声明
///
/// # Example
///
/// ```
/// use rover_bus::ChannelSchema;
///
/// let schema = ChannelSchema::new("imu", ["acc_x", "acc_y"])
///     .unwrap()
///     .with_prefix("imu");
/// assert_eq!(schema.qualify("acc_x").unwrap(), "imu/acc_x");
/// assert!(schema.qualify("gyr_z").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSchema {
    producer: String,
    prefix: Option<String>,
    keys: BTreeSet<String>,
}

impl ChannelSchema {
    /// 创建声明
    ///
    /// # 错误
    /// - `BusError::EmptyChannelName`: 存在空键
    /// - `BusError::DuplicateChannel`: 重复声明
    pub fn new<I, S>(producer: impl Into<String>, keys: I) -> Result<Self, BusError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = BTreeSet::new();
        for key in keys {
            let key = key.into();
            if key.is_empty() {
                return Err(BusError::EmptyChannelName);
            }
            if !set.insert(key.clone()) {
                return Err(BusError::DuplicateChannel(key));
            }
        }
        Ok(Self {
            producer: producer.into(),
            prefix: None,
            keys: set,
        })
    }

    /// 设置通道前缀（以 `/` 连接）
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    pub fn producer(&self) -> &str {
        &self.producer
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// 把声明的键转换为完整通道名
    pub fn qualify(&self, key: &str) -> Result<String, BusError> {
        if !self.keys.contains(key) {
            return Err(BusError::UnknownChannel {
                producer: self.producer.clone(),
                channel: key.to_owned(),
            });
        }
        Ok(match &self.prefix {
            Some(prefix) => format!("{prefix}/{key}"),
            None => key.to_owned(),
        })
    }

    /// 所有完整通道名（按键排序）
    pub fn channels(&self) -> Vec<String> {
        self.keys
            .iter()
            .map(|key| match &self.prefix {
                Some(prefix) => format!("{prefix}/{key}"),
                None => key.clone(),
            })
            .collect()
    }
}
