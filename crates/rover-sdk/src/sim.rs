//! 仿真部件
//!
//! 不依赖硬件的相机、驾驶员、检测器和执行器，用于演示、命令行仿真和集成测试。
//! 仿真车辆与真实车辆使用同一套调度器和检测管理器。

use crate::SdkError;
use rover_bus::{BoundingBox, Bus, ImageFrame, Value};
use rover_detect::{DetectError, Detection, Detector, DetectorManager};
use rover_driver::part::{input_f64, input_image};
use rover_driver::{FnPart, Part, PartDescriptor, PartError, ThreadedPart, Vehicle};
use rover_tools::VehicleConfig;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// 相机图像通道
pub const CAMERA_CHANNEL: &str = "cam/image_array";
/// 驾驶员输出通道
pub const PILOT_CHANNELS: [&str; 2] = ["pilot/angle", "pilot/throttle"];
/// 执行器输出通道
pub const ACTUATOR_CHANNELS: [&str; 2] = ["actuator/angle", "actuator/throttle"];
/// 运行条件通道
pub const RUN_PILOT: &str = "run_pilot";

/// 合成相机
///
/// 后台线程按 `period` 生成图像：黑色背景上一条左右往返扫动的亮竖线。
/// 后台线程首次发布前返回一帧全黑图像。
pub fn synthetic_camera(width: u32, height: u32, period: Duration) -> ThreadedPart<Arc<ImageFrame>> {
    let width = width.max(1);
    let height = height.max(1);
    let mut frame_index: u64 = 0;
    ThreadedPart::polling(
        Arc::new(ImageFrame::new(width, height)),
        period,
        move || {
            let span = u64::from(width) * 2;
            let phase = frame_index % span;
            let column = if phase < u64::from(width) {
                phase
            } else {
                span - 1 - phase
            };
            frame_index += 1;

            let mut frame = ImageFrame::new(width, height);
            for y in 0..height {
                frame.set_pixel(column as u32, y, [255, 255, 255]);
            }
            Ok(Arc::new(frame))
        },
        |frame: &Arc<ImageFrame>| vec![Value::Image(Arc::clone(frame))],
    )
}

/// 合成相机描述符
pub fn camera_descriptor() -> PartDescriptor {
    PartDescriptor::new("camera").threaded().outputs([CAMERA_CHANNEL])
}

/// 脚本驾驶员
///
/// 输出缓慢摆动的转向角和恒定油门；没有图像时本 tick 不输出。
pub fn scripted_pilot(throttle: f64) -> impl Part {
    let mut tick: u64 = 0;
    FnPart::new(move |inputs: &[Option<Value>]| {
        if input_image(inputs, 0).is_none() {
            return Err(PartError::Transient("pilot has no camera image".to_string()));
        }
        tick += 1;
        let angle = 0.3 * (tick as f64 * 0.1).sin();
        Ok(vec![Value::Float(angle), Value::Float(throttle)])
    })
}

/// 脚本驾驶员描述符
pub fn pilot_descriptor() -> PartDescriptor {
    PartDescriptor::new("pilot")
        .inputs([CAMERA_CHANNEL])
        .outputs(PILOT_CHANNELS)
        .run_condition(RUN_PILOT)
}

/// 执行器桩：把检测管理器输出的转向/油门限幅到 `[-1, 1]` 后写出
pub fn actuator() -> impl Part {
    FnPart::new(|inputs: &[Option<Value>]| {
        let (Some(angle), Some(throttle)) = (input_f64(inputs, 0), input_f64(inputs, 1)) else {
            return Ok(Vec::new());
        };
        Ok(vec![
            Value::Float(angle.clamp(-1.0, 1.0)),
            Value::Float(throttle.clamp(-1.0, 1.0)),
        ])
    })
}

/// 执行器描述符
pub fn actuator_descriptor() -> PartDescriptor {
    PartDescriptor::new("actuator")
        .inputs(["detector/angle", "detector/throttle"])
        .outputs(ACTUATOR_CHANNELS)
}

struct ScriptEntry {
    calls: Range<u64>,
    detection: Detection,
}

/// 脚本检测器
///
/// 第 `n` 次调用（从 0 开始）返回所有调用区间包含 `n` 的检测结果。
#[derive(Default)]
pub struct ScriptedDetector {
    script: Vec<ScriptEntry>,
    calls: u64,
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在调用区间 `calls` 内返回 `detection`
    pub fn show(mut self, calls: Range<u64>, detection: Detection) -> Self {
        self.script.push(ScriptEntry { calls, detection });
        self
    }

    /// 为配置中每个已启用的动作依次安排一段可见窗口
    pub fn tour(config: &VehicleConfig) -> Self {
        let width = config.detector.image_width.max(1);
        let size = (width / 8).max(1);
        let center = i32::try_from(width / 2).unwrap_or(i32::MAX);
        let x = center.saturating_sub(i32::try_from(size).unwrap_or(0));
        config
            .enabled_labels()
            .into_iter()
            .zip(0u64..)
            .fold(Self::new(), |detector, (label, i)| {
                let start = 2 + i * 24;
                detector.show(
                    start..start + 12,
                    Detection::new(label, BoundingBox::new(x, 10, size, size), 0.9),
                )
            })
    }

    /// 已调用次数
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, _image: &ImageFrame) -> Result<Vec<Detection>, DetectError> {
        let call = self.calls;
        self.calls += 1;
        Ok(self
            .script
            .iter()
            .filter(|entry| entry.calls.contains(&call))
            .map(|entry| entry.detection.clone())
            .collect())
    }
}

/// 组装仿真车辆
///
/// 部件顺序：合成相机 → 脚本驾驶员 → 检测管理器 → 执行器。
/// 总线预置 `run_pilot = true`。
pub fn simulated_vehicle(config: &VehicleConfig) -> Result<Vehicle, SdkError> {
    simulated_vehicle_with(config, Box::new(ScriptedDetector::tour(config)))
}

/// 使用指定检测器组装仿真车辆
pub fn simulated_vehicle_with(
    config: &VehicleConfig,
    detector: Box<dyn Detector>,
) -> Result<Vehicle, SdkError> {
    config.validate()?;

    let mut bus = Bus::new();
    bus.put_one(RUN_PILOT, true);
    let mut vehicle = Vehicle::with_bus(bus);

    let width = config.detector.image_width;
    let height = (width * 3 / 4).max(1);
    let period = Duration::from_secs_f64(1.0 / config.drive.vehicle_hz);
    vehicle.add(synthetic_camera(width, height, period), camera_descriptor())?;
    vehicle.add(scripted_pilot(0.5), pilot_descriptor())?;

    let manager = DetectorManager::from_config(detector, config)?;
    vehicle.add(manager, DetectorManager::default_descriptor("detector"))?;
    vehicle.add(actuator(), actuator_descriptor())?;

    debug!(
        "Simulated vehicle assembled with parts {:?}",
        vehicle.part_names().collect::<Vec<_>>()
    );
    Ok(vehicle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_driver::{LoopConfig, Part};

    #[test]
    fn test_scripted_detector_windows() {
        let mut detector = ScriptedDetector::new().show(
            1..3,
            Detection::new("cone", BoundingBox::new(0, 0, 4, 4), 0.9),
        );
        let frame = ImageFrame::new(8, 8);
        let seen: Vec<usize> = (0..4)
            .map(|_| detector.detect(&frame).unwrap().len())
            .collect();
        assert_eq!(seen, vec![0, 1, 1, 0]);
        assert_eq!(detector.calls(), 4);
    }

    #[test]
    fn test_tour_covers_enabled_labels() {
        let mut config = VehicleConfig::default();
        config.pass_object.enabled = true;
        config.demo.enabled = true;
        let mut detector = ScriptedDetector::tour(&config);
        let frame = ImageFrame::new(160, 120);
        let labels: Vec<String> = (0..60)
            .flat_map(|_| detector.detect(&frame).unwrap())
            .map(|d| d.label)
            .collect();
        assert!(labels.iter().any(|l| l == "cone"));
        assert!(labels.iter().any(|l| l == "person"));
    }

    #[test]
    fn test_actuator_clamps() {
        let mut part = actuator();
        let out = part
            .run(&[Some(Value::Float(1.7)), Some(Value::Float(-0.2))])
            .unwrap();
        assert_eq!(out, vec![Value::Float(1.0), Value::Float(-0.2)]);
        assert!(part.run(&[None, None]).unwrap().is_empty());
    }

    #[test]
    fn test_simulated_vehicle_runs() {
        let mut config = VehicleConfig::default();
        config.drive.vehicle_hz = 200.0;
        config.detector.run_hz = 50.0;
        config.demo.enabled = true;

        let mut vehicle = simulated_vehicle(&config).unwrap();
        assert_eq!(
            vehicle.part_names().collect::<Vec<_>>(),
            vec!["camera", "pilot", "detector", "actuator"]
        );

        let loop_config = LoopConfig {
            max_loop_count: Some(10),
            ..LoopConfig::from(&config.drive)
        };
        let summary = vehicle.start(&loop_config).unwrap();
        assert_eq!(summary.loop_count, 10);
        assert!(vehicle.bus().get_one("actuator/throttle").is_some());
    }
}
