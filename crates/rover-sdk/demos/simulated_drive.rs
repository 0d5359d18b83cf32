//! 仿真驾驶示例
//!
//! 用合成相机和脚本检测器驱动完整的部件流水线，观察 stop-and-go 与演示动作的输出。
//!
//! # 使用说明
//!
//! ```bash
//! cargo run -p rover-sdk --example simulated_drive
//! RUST_LOG=debug cargo run -p rover-sdk --example simulated_drive
//! ```

use rover_sdk::prelude::*;
use rover_sdk::sim;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    rover_sdk::init_logger();

    println!("════════════════════════════════════════");
    println!("       仿真驾驶示例");
    println!("════════════════════════════════════════");
    println!();

    // === 1. 配置 ===

    let mut config = VehicleConfig::default();
    config.drive.vehicle_hz = 20.0;
    config.drive.max_loops = Some(120);
    config.drive.verbose = true;
    config.detector.run_hz = 10.0;
    config.stop_and_go.enabled = true;
    config.stop_and_go.pause_time_s = 0.5;
    config.demo.enabled = true;
    config.demo.trigger_times = 3;
    config.validate()?;
    println!("✅ 已启用动作: {:?}", config.enabled_labels());

    // === 2. 组装车辆 ===

    let mut vehicle = sim::simulated_vehicle(&config)?;
    println!("✅ 部件顺序: {:?}", vehicle.part_names().collect::<Vec<_>>());
    println!();

    // === 3. 运行 ===

    let stop = vehicle.stop_handle();
    let watchdog = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_secs(30));
        stop.stop();
    });

    println!("⏳ 驾驶循环运行中...");
    let summary = vehicle.start(&LoopConfig::from(&config.drive))?;
    drop(watchdog);

    // === 4. 结果 ===

    let metrics = vehicle.metrics().snapshot();
    println!();
    println!("📊 循环次数: {}", summary.loop_count);
    println!("📊 实际频率: {:.1} Hz", summary.effective_hz());
    println!("📊 超时 tick: {}", metrics.overruns);
    println!("📊 部件错误: {}", metrics.part_errors);
    println!(
        "📊 最终执行器输出: angle={:?} throttle={:?}",
        vehicle.bus().get_one("actuator/angle"),
        vehicle.bus().get_one("actuator/throttle"),
    );

    Ok(())
}
