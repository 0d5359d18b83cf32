//! 部件约定
//!
//! 部件是参与调度循环的组件（传感器、控制器、执行器、检测器）。每个部件通过
//! `PartDescriptor` 显式声明自己具备的能力，调度器只按声明分派，不做运行时探测：
//!
//! | 能力 | 方法 | 调用线程 |
//! |------|------|----------|
//! | 同步运行 | [`Part::run`] | 调度线程 |
//! | 线程读取 | [`Part::run_threaded`] | 调度线程（不得阻塞） |
//! | 后台更新 | [`Part::take_background`] 返回的 worker | 独立线程 |
//! | 关闭 | [`Part::shutdown`] | 调度线程（停止时） |

use crate::error::{DriverError, PartError};
use crate::worker::BackgroundUpdate;
use rover_bus::{ImageFrame, Value};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// 部件输入（按声明顺序，通道从未写入时为 `None`）
///
/// 绝大多数部件的输入不超过 4 个，使用 SmallVec 避免每 tick 堆分配。
pub type Inputs = SmallVec<[Option<Value>; 4]>;

/// 部件输出（按声明顺序）
///
/// 空向量表示本 tick 不写总线。
pub type Outputs = Vec<Value>;

/// 部件能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    SyncRun,
    ThreadedRun,
    BackgroundUpdate,
    Shutdown,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::SyncRun => "run",
            Capability::ThreadedRun => "run_threaded",
            Capability::BackgroundUpdate => "background_update",
            Capability::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

/// 能力声明
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub sync_run: bool,
    pub threaded_run: bool,
    pub background_update: bool,
    pub shutdown: bool,
}

impl Capabilities {
    /// 同步部件：每 tick 在调度线程上调用 `run`
    pub const fn synchronous() -> Self {
        Self {
            sync_run: true,
            threaded_run: false,
            background_update: false,
            shutdown: true,
        }
    }

    /// 线程化部件：后台线程持续更新，调度线程通过 `run_threaded` 读取最新快照
    pub const fn threaded() -> Self {
        Self {
            sync_run: false,
            threaded_run: true,
            background_update: true,
            shutdown: true,
        }
    }

    /// 是否声明了指定能力
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::SyncRun => self.sync_run,
            Capability::ThreadedRun => self.threaded_run,
            Capability::BackgroundUpdate => self.background_update,
            Capability::Shutdown => self.shutdown,
        }
    }

    /// 校验能力组合
    ///
    /// `sync_run` 与 `threaded_run` 必须恰好声明一个；后台更新只对线程化部件有意义。
    pub fn validate(&self) -> Result<(), String> {
        match (self.sync_run, self.threaded_run) {
            (true, true) => {
                return Err("a part cannot declare both run and run_threaded".to_string());
            },
            (false, false) => {
                return Err("a part must declare either run or run_threaded".to_string());
            },
            _ => {},
        }
        if self.background_update && !self.threaded_run {
            return Err("background_update requires run_threaded".to_string());
        }
        Ok(())
    }
}

/// 部件描述符
///
/// 声明部件名、输入输出通道、能力以及可选的运行条件通道。
/// 运行条件通道值为真时部件才会被调用；通道不存在或值为假时本 tick 跳过该部件。
#[derive(Debug, Clone, PartialEq)]
pub struct PartDescriptor {
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub capabilities: Capabilities,
    pub run_condition: Option<String>,
}

impl PartDescriptor {
    /// 创建同步部件描述符
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            capabilities: Capabilities::synchronous(),
            run_condition: None,
        }
    }

    pub fn inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// 声明为线程化部件
    pub fn threaded(self) -> Self {
        self.capabilities(Capabilities::threaded())
    }

    pub fn run_condition(mut self, channel: impl Into<String>) -> Self {
        self.run_condition = Some(channel.into());
        self
    }

    /// 校验描述符
    ///
    /// - 部件名非空
    /// - 通道名非空，输出通道不重复
    /// - 能力组合合法
    pub fn validate(&self) -> Result<(), DriverError> {
        let invalid = |reason: String| DriverError::InvalidDescriptor {
            part: self.name.clone(),
            reason,
        };

        if self.name.is_empty() {
            return Err(invalid("part name must not be empty".to_string()));
        }
        if self.inputs.iter().chain(&self.outputs).any(String::is_empty) {
            return Err(invalid("channel names must not be empty".to_string()));
        }
        if let Some(condition) = &self.run_condition
            && condition.is_empty()
        {
            return Err(invalid("run condition channel must not be empty".to_string()));
        }

        let mut seen = HashSet::with_capacity(self.outputs.len());
        if let Some(dup) = self.outputs.iter().find(|o| !seen.insert(o.as_str())) {
            return Err(invalid(format!("output channel '{}' declared twice", dup)));
        }

        self.capabilities.validate().map_err(invalid)
    }
}

/// 部件 trait
///
/// 所有方法都有默认实现；部件只需实现其描述符声明的能力。
/// 未声明的能力被调用时返回 `PartError::Unsupported`。
pub trait Part: Send {
    /// 同步运行：在调度线程上执行，输入按描述符顺序给出
    fn run(&mut self, inputs: &[Option<Value>]) -> Result<Outputs, PartError> {
        let _ = inputs;
        Err(PartError::Unsupported(Capability::SyncRun))
    }

    /// 线程读取：返回后台线程最近一次发布的状态，不得阻塞
    fn run_threaded(&mut self, inputs: &[Option<Value>]) -> Result<Outputs, PartError> {
        let _ = inputs;
        Err(PartError::Unsupported(Capability::ThreadedRun))
    }

    /// 取出后台更新 worker（车辆启动时调用一次，之后在独立线程运行）
    fn take_background(&mut self) -> Option<Box<dyn BackgroundUpdate>> {
        None
    }

    /// 释放资源
    ///
    /// 必须幂等：车辆停止时调用，也可能在 Drop 路径上再次被调用。
    fn shutdown(&mut self) -> Result<(), PartError> {
        Ok(())
    }
}

impl<P: Part + ?Sized> Part for Box<P> {
    fn run(&mut self, inputs: &[Option<Value>]) -> Result<Outputs, PartError> {
        (**self).run(inputs)
    }

    fn run_threaded(&mut self, inputs: &[Option<Value>]) -> Result<Outputs, PartError> {
        (**self).run_threaded(inputs)
    }

    fn take_background(&mut self) -> Option<Box<dyn BackgroundUpdate>> {
        (**self).take_background()
    }

    fn shutdown(&mut self) -> Result<(), PartError> {
        (**self).shutdown()
    }
}

/// 闭包部件
///
/// 把 `FnMut(&[Option<Value>]) -> Result<Outputs, PartError>` 包装为同步部件，
/// 适合简单的变换、常量源和执行器桩。
pub struct FnPart<F> {
    f: F,
}

impl<F> FnPart<F>
where
    F: FnMut(&[Option<Value>]) -> Result<Outputs, PartError> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Part for FnPart<F>
where
    F: FnMut(&[Option<Value>]) -> Result<Outputs, PartError> + Send,
{
    fn run(&mut self, inputs: &[Option<Value>]) -> Result<Outputs, PartError> {
        (self.f)(inputs)
    }
}

/// 读取第 `index` 个输入的浮点值（整数会被转换）
pub fn input_f64(inputs: &[Option<Value>], index: usize) -> Option<f64> {
    inputs.get(index)?.as_ref()?.as_f64()
}

/// 读取第 `index` 个输入的布尔值
pub fn input_bool(inputs: &[Option<Value>], index: usize) -> Option<bool> {
    inputs.get(index)?.as_ref()?.as_bool()
}

/// 读取第 `index` 个输入的图像
pub fn input_image(inputs: &[Option<Value>], index: usize) -> Option<Arc<ImageFrame>> {
    inputs.get(index)?.as_ref()?.as_image().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_validate() {
        assert!(Capabilities::synchronous().validate().is_ok());
        assert!(Capabilities::threaded().validate().is_ok());

        let both = Capabilities {
            sync_run: true,
            threaded_run: true,
            ..Default::default()
        };
        assert!(both.validate().is_err());
        assert!(Capabilities::default().validate().is_err());

        let background_only = Capabilities {
            sync_run: true,
            background_update: true,
            ..Default::default()
        };
        assert!(background_only.validate().is_err());
    }

    #[test]
    fn test_descriptor_validate() {
        let ok = PartDescriptor::new("pilot")
            .inputs(["cam/image_array"])
            .outputs(["pilot/angle", "pilot/throttle"])
            .run_condition("run_pilot");
        assert!(ok.validate().is_ok());

        let dup = PartDescriptor::new("pilot").outputs(["pilot/angle", "pilot/angle"]);
        assert!(matches!(
            dup.validate(),
            Err(DriverError::InvalidDescriptor { .. })
        ));

        let empty_channel = PartDescriptor::new("pilot").inputs([""]);
        assert!(empty_channel.validate().is_err());

        assert!(PartDescriptor::new("").validate().is_err());
        assert!(PartDescriptor::new("x").run_condition("").validate().is_err());
    }

    #[test]
    fn test_default_methods_report_unsupported() {
        struct Nothing;
        impl Part for Nothing {}

        let mut part = Nothing;
        assert!(matches!(
            part.run(&[]),
            Err(PartError::Unsupported(Capability::SyncRun))
        ));
        assert!(matches!(
            part.run_threaded(&[]),
            Err(PartError::Unsupported(Capability::ThreadedRun))
        ));
        assert!(part.take_background().is_none());
        assert!(part.shutdown().is_ok());
    }

    #[test]
    fn test_fn_part_and_input_helpers() {
        let mut doubler = FnPart::new(|inputs: &[Option<Value>]| {
            let x = input_f64(inputs, 0).unwrap_or(0.0);
            Ok(vec![Value::Float(x * 2.0)])
        });
        assert_eq!(
            doubler.run(&[Some(Value::Int(3))]).unwrap(),
            vec![Value::Float(6.0)]
        );
        assert_eq!(doubler.run(&[None]).unwrap(), vec![Value::Float(0.0)]);

        let inputs = [Some(Value::Bool(true)), None];
        assert_eq!(input_bool(&inputs, 0), Some(true));
        assert_eq!(input_bool(&inputs, 1), None);
        assert_eq!(input_bool(&inputs, 5), None);
        assert!(input_image(&inputs, 0).is_none());
    }
}
