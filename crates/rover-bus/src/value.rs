//! 通道值定义

use crate::image::ImageFrame;
use std::sync::Arc;

/// 总线通道上的动态值
///
/// 图像使用 `Arc` 包装，读取通道时只克隆指针，不复制像素数据。
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Image(Arc<ImageFrame>),
    /// 单个通道名对应多个值时，整体保存为列表
    List(Vec<Value>),
}

impl Value {
    /// 数值视图（`Int` 会转换为浮点）
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Arc<ImageFrame>> {
        match self {
            Value::Image(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// 真值判断（用于部件的运行条件通道）
    ///
    /// - `Bool`：原值
    /// - 数值：非零为真
    /// - 文本/列表：非空为真
    /// - 图像：总为真
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(v) => *v,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Text(v) => !v.is_empty(),
            Value::Image(_) => true,
            Value::List(v) => !v.is_empty(),
        }
    }

    /// 类型名称（用于日志和错误信息）
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Image(_) => "image",
            Value::List(_) => "list",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<ImageFrame> for Value {
    fn from(v: ImageFrame) -> Self {
        Value::Image(Arc::new(v))
    }
}

impl From<Arc<ImageFrame>> for Value {
    fn from(v: Arc<ImageFrame>) -> Self {
        Value::Image(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Bool(true).as_f64(), None);
        assert_eq!(Value::Int(3).as_i64(), Some(3));
        assert_eq!(Value::Float(3.0).as_i64(), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(Value::from("user").is_truthy());
        assert!(!Value::List(Vec::new()).is_truthy());
        assert!(Value::from(ImageFrame::new(2, 2)).is_truthy());
    }

    #[test]
    fn test_image_value_shares_buffer() {
        let frame = Arc::new(ImageFrame::new(4, 4));
        let value = Value::from(frame.clone());
        let copy = value.clone();
        let image = copy.as_image().unwrap();
        assert!(Arc::ptr_eq(image, &frame));
        assert_eq!(value.type_name(), "image");
    }
}
