//! 通道总线
//!
//! 按通道名保存最新值：写入即覆盖，读取返回最近一次写入，不保留历史。
//! 总线在进程启动时创建，生命周期与进程相同，不做持久化。

use crate::error::BusError;
use crate::schema::ChannelSchema;
use crate::value::Value;
use std::collections::HashMap;

/// 通道总线
///
/// # Example
///
/// ```
/// use rover_bus::{Bus, Value};
///
/// let mut bus = Bus::new();
/// bus.put(&["pilot/angle", "pilot/throttle"], vec![Value::Float(0.1), Value::Float(0.3)])
///     .unwrap();
/// let values = bus.get(&["pilot/angle", "user/mode"]);
/// assert_eq!(values, vec![Some(Value::Float(0.1)), None]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Bus {
    slots: HashMap<String, Value>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按位置写入多个通道
    ///
    /// - 只有一个通道名时：若恰好一个值，则直接保存该值（不包装）；
    ///   否则把全部值作为 `Value::List` 保存在该通道下
    /// - 多个通道名时：逐个按位置对应
    ///
    /// # 错误
    /// - `BusError::Arity`: 多个通道名且数量与值数量不一致（此时不写入任何通道）
    /// - `BusError::EmptyChannelName`: 存在空通道名
    pub fn put<S: AsRef<str>>(&mut self, names: &[S], values: Vec<Value>) -> Result<(), BusError> {
        if names.iter().any(|n| n.as_ref().is_empty()) {
            return Err(BusError::EmptyChannelName);
        }
        match names {
            [] if values.is_empty() => Ok(()),
            [name] => {
                let value = if values.len() == 1 {
                    values.into_iter().next().unwrap_or(Value::List(Vec::new()))
                } else {
                    Value::List(values)
                };
                self.slots.insert(name.as_ref().to_owned(), value);
                Ok(())
            },
            _ if names.len() != values.len() => Err(BusError::Arity {
                names: names.len(),
                values: values.len(),
            }),
            _ => {
                for (name, value) in names.iter().zip(values) {
                    self.slots.insert(name.as_ref().to_owned(), value);
                }
                Ok(())
            },
        }
    }

    /// 写入单个通道
    pub fn put_one(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.slots.insert(name.into(), value.into());
    }

    /// 按位置读取多个通道，从未写入的通道返回 `None`
    pub fn get<S: AsRef<str>>(&self, names: &[S]) -> Vec<Option<Value>> {
        names
            .iter()
            .map(|name| self.slots.get(name.as_ref()).cloned())
            .collect()
    }

    /// 借用读取单个通道
    pub fn get_one(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// 删除通道，返回被删除的数量
    pub fn remove<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        names
            .iter()
            .filter(|name| self.slots.remove(name.as_ref()).is_some())
            .count()
    }

    /// 按生产者声明批量写入
    ///
    /// 先校验所有键都已在 `schema` 中声明，全部通过后才写入；任一键未声明
    /// 则整批拒绝，总线保持不变。
    pub fn update<K, I>(&mut self, schema: &ChannelSchema, entries: I) -> Result<(), BusError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let staged = entries
            .into_iter()
            .map(|(key, value)| schema.qualify(key.as_ref()).map(|channel| (channel, value)))
            .collect::<Result<Vec<_>, _>>()?;
        self.slots.extend(staged);
        Ok(())
    }

    /// 所有已写入的通道名（无序）
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
