//! 检测管理器端到端场景
//!
//! 在真实的调度循环中运行检测管理器，用记录部件收集每个 tick 的执行器输入。

use crossbeam_channel::{Receiver, unbounded};
use rover_sdk::prelude::*;
use rover_sdk::sim::ScriptedDetector;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const PILOT_ANGLE: f64 = 0.1;
const PILOT_THROTTLE: f64 = 0.5;

/// 固定输出驾驶员指令和一帧 160 像素宽的图像
fn source_part() -> impl Part {
    let frame = Arc::new(ImageFrame::new(160, 120));
    FnPart::new(move |_inputs: &[Option<Value>]| {
        Ok(vec![
            Value::Float(PILOT_ANGLE),
            Value::Float(PILOT_THROTTLE),
            Value::Image(Arc::clone(&frame)),
        ])
    })
}

fn source_descriptor() -> PartDescriptor {
    PartDescriptor::new("source").outputs(["pilot/angle", "pilot/throttle", "cam/image_array"])
}

/// 记录检测管理器输出的 (angle, throttle)
fn recorder() -> (impl Part, Receiver<(f64, f64)>) {
    let (tx, rx) = unbounded();
    let part = FnPart::new(move |inputs: &[Option<Value>]| {
        let angle = inputs[0].as_ref().and_then(Value::as_f64);
        let throttle = inputs[1].as_ref().and_then(Value::as_f64);
        if let (Some(angle), Some(throttle)) = (angle, throttle) {
            let _ = tx.send((angle, throttle));
        }
        Ok(Vec::new())
    });
    (part, rx)
}

fn build_vehicle(manager: DetectorManager) -> (Vehicle, Receiver<(f64, f64)>) {
    let mut bus = Bus::new();
    bus.put_one("run_pilot", true);
    let mut vehicle = Vehicle::with_bus(bus);
    vehicle.add(source_part(), source_descriptor()).unwrap();
    vehicle
        .add(manager, DetectorManager::default_descriptor("detector"))
        .unwrap();

    let (part, rx) = recorder();
    vehicle
        .add(
            part,
            PartDescriptor::new("recorder").inputs(["detector/angle", "detector/throttle"]),
        )
        .unwrap();
    (vehicle, rx)
}

fn drive(vehicle: &mut Vehicle, ticks: u64) {
    let summary = vehicle
        .start(&LoopConfig {
            rate_hz: 1000.0,
            max_loop_count: Some(ticks),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(summary.loop_count, ticks);
}

fn stop_sign() -> Detection {
    Detection::new("stop sign", BoundingBox::new(70, 10, 20, 20), 0.9)
}

/// 停车-通行：反向脉冲、空档、第二次反向脉冲、回升，然后恢复驾驶员油门
#[test]
fn test_stop_and_go_full_cycle() {
    let mut config = VehicleConfig::default();
    config.drive.vehicle_hz = 100.0;
    config.detector.run_hz = 100.0;
    config.stop_and_go.enabled = true;
    config.stop_and_go.pause_time_s = 0.0;

    let detector = ScriptedDetector::new().show(0..3, stop_sign());
    let manager = DetectorManager::from_config(Box::new(detector), &config).unwrap();
    let (mut vehicle, rx) = build_vehicle(manager);
    drive(&mut vehicle, 20);

    let throttles: Vec<f64> = rx.try_iter().map(|(_, t)| t).collect();
    assert_eq!(throttles.len(), 20);
    assert_eq!(&throttles[..3], &[-1.0, 0.0, -1.0]);

    // 回升阶段单调递增且不超过 0
    let recovering: Vec<f64> = throttles[3..]
        .iter()
        .copied()
        .take_while(|t| *t <= 0.0)
        .collect();
    assert!(recovering.len() >= 4);
    assert!(recovering.windows(2).all(|w| w[1] >= w[0]));

    // 目标离开后恢复驾驶员油门
    assert_eq!(*throttles.last().unwrap(), PILOT_THROTTLE);
}

/// 绕行：目标在画面中央时转向至少偏开 tolerance，并按倍率加速
#[test]
fn test_pass_object_keeps_clearance() {
    let mut config = VehicleConfig::default();
    config.drive.vehicle_hz = 100.0;
    config.detector.run_hz = 100.0;
    config.stop_and_go.enabled = false;
    config.pass_object.enabled = true;
    config.pass_object.speedup_multiplier = 1.5;

    let cone = Detection::new("cone", BoundingBox::new(70, 10, 20, 20), 0.9);
    let detector = ScriptedDetector::new().show(0..5, cone);
    let manager = DetectorManager::from_config(Box::new(detector), &config).unwrap();
    let (mut vehicle, rx) = build_vehicle(manager);
    drive(&mut vehicle, 10);

    let outputs: Vec<(f64, f64)> = rx.try_iter().collect();
    assert_eq!(outputs.len(), 10);
    for (angle, throttle) in &outputs[..5] {
        assert!((angle - 0.25).abs() < 1e-9, "expected clearance angle, got {angle}");
        assert!((throttle - PILOT_THROTTLE * 1.5).abs() < 1e-9);
    }
    assert_eq!(outputs[9], (PILOT_ANGLE, PILOT_THROTTLE));
}

/// 未注册的标签和低于阈值的结果不会触发动作
#[test]
fn test_unregistered_and_weak_detections_pass_through() {
    let mut config = VehicleConfig::default();
    config.drive.vehicle_hz = 100.0;
    config.detector.run_hz = 100.0;
    config.stop_and_go.enabled = true;
    config
        .detector
        .score_thresholds
        .insert("stop sign".to_string(), 0.95);

    let detector = ScriptedDetector::new()
        .show(0..10, Detection::new("bicycle", BoundingBox::new(0, 0, 8, 8), 0.99))
        .show(0..10, stop_sign());
    let manager = DetectorManager::from_config(Box::new(detector), &config).unwrap();
    let (mut vehicle, rx) = build_vehicle(manager);
    drive(&mut vehicle, 10);

    assert!(
        rx.try_iter()
            .all(|output| output == (PILOT_ANGLE, PILOT_THROTTLE))
    );
}

/// 检测器只在分频触发的 tick 上运行
#[test]
fn test_detector_runs_at_divided_rate() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);
    let detector = move |_frame: &ImageFrame| -> Result<Vec<Detection>, DetectError> {
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(Vec::new())
    };

    let config = rover_sdk::tools::DetectorConfig {
        run_hz: 25.0,
        ..Default::default()
    };
    let manager = DetectorManager::new(Box::new(detector), config, 100.0).unwrap();
    assert_eq!(manager.divider().run_trigger(), 4);

    let (mut vehicle, rx) = build_vehicle(manager);
    drive(&mut vehicle, 20);

    assert_eq!(calls.load(Ordering::Relaxed), 5);
    assert_eq!(rx.try_iter().count(), 20);
}

/// 检测器失败时本 tick 透传，循环继续
#[test]
fn test_detector_failure_does_not_stop_loop() {
    let detector = |_frame: &ImageFrame| -> Result<Vec<Detection>, DetectError> {
        Err(DetectError::Backend("model not loaded".to_string()))
    };
    let config = rover_sdk::tools::DetectorConfig {
        run_hz: 100.0,
        ..Default::default()
    };
    let mut manager = DetectorManager::new(Box::new(detector), config, 100.0).unwrap();
    manager
        .add_action(StopAndGoAction::new("stop sign", Duration::ZERO))
        .unwrap();

    let (mut vehicle, rx) = build_vehicle(manager);
    drive(&mut vehicle, 5);

    let outputs: Vec<(f64, f64)> = rx.try_iter().collect();
    assert_eq!(outputs, vec![(PILOT_ANGLE, PILOT_THROTTLE); 5]);
    assert_eq!(vehicle.metrics().snapshot().part_errors, 0);
}
