//! 检测管理器
//!
//! 作为同步部件挂在驾驶员（pilot）之后：按分频运行检测器，选出已注册标签中
//! 置信度最高的目标，计算其水平位置，并把转向/油门交给对应的动作处理。
//!
//! # 分派规则
//!
//! - 没有动作在运行时：检测到已注册标签则激活其动作；否则每次检测后分频计数清零
//! - 有动作在运行时：每个 tick 都检测并调用 `manage`，`found` 表示检测到的标签是否与
//!   运行中的动作标签一致
//! - 动作返回 `reset` 时清除运行中的动作，并让下一个 tick 立即检测

use crate::action::{Action, DemoAction};
use crate::detector::{Detection, DetectionStats, Detector};
use crate::error::DetectError;
use crate::overlay;
use crate::pass_object::PassObjectAction;
use crate::stop_and_go::StopAndGoAction;
use rover_bus::{ImageFrame, Value};
use rover_driver::part::{input_f64, input_image};
use rover_driver::{Outputs, Part, PartDescriptor, PartError, RateDivider};
use rover_tools::{DetectorConfig, VehicleConfig};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// 单个 tick 的输出
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub angle: f64,
    pub throttle: f64,
    pub image: Option<Arc<ImageFrame>>,
}

/// 检测管理器
pub struct DetectorManager {
    detector: Box<dyn Detector>,
    config: DetectorConfig,
    divider: RateDivider,
    actions: Vec<Box<dyn Action>>,
    running_action: Option<usize>,
    last_detection: Option<Detection>,
    position: f64,
    stats: DetectionStats,
    shut_down: bool,
}

impl DetectorManager {
    /// 默认输入通道：驾驶员转向、驾驶员油门、相机图像
    pub const INPUTS: [&'static str; 3] = ["pilot/angle", "pilot/throttle", "cam/image_array"];
    /// 默认输出通道
    pub const OUTPUTS: [&'static str; 3] =
        ["detector/angle", "detector/throttle", "detector/image_array"];
    /// 默认运行条件通道
    pub const RUN_CONDITION: &'static str = "run_pilot";

    /// 创建检测管理器
    ///
    /// `vehicle_hz` 为主循环频率，与 `config.run_hz` 一起决定分频。
    pub fn new(
        detector: Box<dyn Detector>,
        config: DetectorConfig,
        vehicle_hz: f64,
    ) -> Result<Self, DetectError> {
        let divider = RateDivider::new(vehicle_hz, config.run_hz)?;
        debug!(
            "Detector runs every {} ticks ({} Hz / {} Hz)",
            divider.run_trigger(),
            vehicle_hz,
            config.run_hz
        );
        Ok(Self {
            detector,
            config,
            divider,
            actions: Vec::new(),
            running_action: None,
            last_detection: None,
            position: 0.0,
            stats: DetectionStats::default(),
            shut_down: false,
        })
    }

    /// 按车辆配置创建，并注册所有已启用的动作
    pub fn from_config(
        detector: Box<dyn Detector>,
        config: &VehicleConfig,
    ) -> Result<Self, DetectError> {
        config.validate()?;
        let mut manager = Self::new(detector, config.detector.clone(), config.drive.vehicle_hz)?;
        if config.stop_and_go.enabled {
            manager.add_action(StopAndGoAction::from_config(&config.stop_and_go))?;
        }
        if config.pass_object.enabled {
            manager.add_action(PassObjectAction::from_config(&config.pass_object))?;
        }
        if config.demo.enabled {
            manager.add_action(DemoAction::from_config(&config.demo))?;
        }
        Ok(manager)
    }

    /// 注册动作
    pub fn add_action<A: Action + 'static>(&mut self, action: A) -> Result<(), DetectError> {
        self.add_boxed_action(Box::new(action))
    }

    pub fn add_boxed_action(&mut self, action: Box<dyn Action>) -> Result<(), DetectError> {
        let label = action.label();
        if label.is_empty() {
            return Err(DetectError::EmptyLabel);
        }
        if self.actions.iter().any(|a| a.label() == label) {
            return Err(DetectError::DuplicateAction(label.to_string()));
        }
        info!("Registered action for label '{}'", label);
        self.actions.push(action);
        Ok(())
    }

    /// 已注册的标签（注册顺序）
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.label())
    }

    /// 运行中动作的标签
    pub fn running_action(&self) -> Option<&str> {
        self.running_action
            .and_then(|idx| self.actions.get(idx))
            .map(|a| a.label())
    }

    /// 最近一次检测到的目标位置（未检测到时为 0）
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn last_detection(&self) -> Option<&Detection> {
        self.last_detection.as_ref()
    }

    pub fn stats(&self) -> DetectionStats {
        self.stats
    }

    pub fn divider(&self) -> &RateDivider {
        &self.divider
    }

    /// 对应的部件描述符
    pub fn default_descriptor(name: impl Into<String>) -> PartDescriptor {
        PartDescriptor::new(name)
            .inputs(Self::INPUTS)
            .outputs(Self::OUTPUTS)
            .run_condition(Self::RUN_CONDITION)
    }

    /// 执行一个 tick
    ///
    /// 分频未到时原样透传；否则检测、（可选）标记图像并分派动作。
    pub fn step(
        &mut self,
        angle: f64,
        throttle: f64,
        image: Option<Arc<ImageFrame>>,
    ) -> StepOutput {
        if !self.divider.advance() {
            return StepOutput {
                angle,
                throttle,
                image,
            };
        }

        self.position = 0.0;
        let mut image = image;
        let detection = image.as_deref().and_then(|frame| self.detect(frame));

        if self.config.show_bounding_box
            && let (Some(found), Some(frame)) = (&detection, image.as_mut())
        {
            overlay::mark(Arc::make_mut(frame), found);
        }

        let label = detection.as_ref().map(|d| d.label.clone());
        self.last_detection = detection;
        let (angle, throttle) = self.dispatch(label.as_deref(), angle, throttle);

        StepOutput {
            angle,
            throttle,
            image,
        }
    }

    /// 运行检测器并选出目标
    ///
    /// 结果按置信度降序排列并截断到 `max_results`，然后取第一个已注册且达到
    /// 阈值的标签。检测器失败视为本次未检测到目标。
    fn detect(&mut self, frame: &ImageFrame) -> Option<Detection> {
        let start = Instant::now();
        let mut results = match self.detector.detect(frame) {
            Ok(results) => results,
            Err(e) => {
                self.stats.record_failure();
                warn!("Object detection failed, passing tick through: {}", e);
                return None;
            },
        };
        self.stats.record(start.elapsed());

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(self.config.max_results);

        let selected = results.into_iter().find(|d| {
            self.actions.iter().any(|a| a.label() == d.label)
                && d.score >= self.config.threshold_for(&d.label)
        })?;

        let center = frame.center_x();
        if center > 0.0 {
            self.position = ((selected.bbox.center_x() - center) / center).clamp(-1.0, 1.0);
        }
        debug!(
            "object label: {}, bbox: {:?}, score: {:.3}, position: {:.3}",
            selected.label, selected.bbox, selected.score, self.position
        );
        Some(selected)
    }

    fn dispatch(&mut self, label: Option<&str>, angle: f64, throttle: f64) -> (f64, f64) {
        if self.running_action.is_none()
            && let Some(label) = label
        {
            self.running_action = self.actions.iter().position(|a| a.label() == label);
        }

        let Some(action) = self.running_action.and_then(|idx| self.actions.get_mut(idx)) else {
            self.running_action = None;
            self.divider.reset();
            return (angle, throttle);
        };

        let found = label == Some(action.label());
        let command = action.manage(angle, throttle, found, self.position);
        info!(
            "dispatch action_label: {}, reset_action: {}, angle: {:.3}, throttle: {:.3}",
            action.label(),
            command.reset,
            command.angle,
            command.throttle
        );
        if command.reset {
            self.running_action = None;
            self.divider.arm();
        }
        (command.angle, command.throttle)
    }
}

impl Part for DetectorManager {
    fn run(&mut self, inputs: &[Option<Value>]) -> Result<Outputs, PartError> {
        let (Some(angle), Some(throttle)) = (input_f64(inputs, 0), input_f64(inputs, 1)) else {
            debug!("Pilot outputs not available yet, skipping detection");
            return Ok(Vec::new());
        };
        let Some(image) = input_image(inputs, 2) else {
            debug!("Camera image not available yet, skipping detection");
            return Ok(Vec::new());
        };

        let output = self.step(angle, throttle, Some(image));
        let mut outputs = vec![Value::Float(output.angle), Value::Float(output.throttle)];
        if let Some(image) = output.image {
            outputs.push(Value::Image(image));
        }
        Ok(outputs)
    }

    fn shutdown(&mut self) -> Result<(), PartError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        match self.stats.average() {
            Some(average) => info!(
                "Detector - average detection time {:.3}s over {} runs",
                average.as_secs_f64(),
                self.stats.runs
            ),
            None => info!("Detector - no detections were run"),
        }
        Ok(())
    }
}
