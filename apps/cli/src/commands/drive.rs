//! drive 命令
//!
//! 用合成相机、脚本驾驶员和脚本检测器运行完整的驾驶循环

use anyhow::{Context, Result};
use clap::Args;
use rover_sdk::sim;
use rover_sdk::{LoopConfig, VehicleConfig};
use std::path::PathBuf;

/// 驾驶命令参数
#[derive(Args, Debug)]
pub struct DriveCommand {
    /// 配置文件（缺省使用默认配置）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 最大循环次数（覆盖配置）
    #[arg(short, long)]
    pub max_loops: Option<u64>,

    /// 主循环频率（覆盖配置）
    #[arg(long)]
    pub vehicle_hz: Option<f64>,

    /// 输出超时告警和部件耗时
    #[arg(short, long)]
    pub verbose: bool,
}

impl DriveCommand {
    /// 合并配置文件与命令行覆盖项
    pub fn resolve_config(&self) -> Result<VehicleConfig> {
        let mut config = match &self.config {
            Some(path) => super::config::load(path)?,
            None => VehicleConfig::default(),
        };
        if let Some(max_loops) = self.max_loops {
            config.drive.max_loops = Some(max_loops);
        }
        if let Some(vehicle_hz) = self.vehicle_hz {
            config.drive.vehicle_hz = vehicle_hz;
        }
        config.drive.verbose |= self.verbose;
        config.validate().context("命令行参数无效")?;
        Ok(config)
    }

    pub fn execute(&self) -> Result<()> {
        let config = self.resolve_config()?;
        let mut vehicle = sim::simulated_vehicle(&config)?;

        let stop = vehicle.stop_handle();
        ctrlc::set_handler(move || {
            stop.stop();
            println!("\n收到退出信号，正在关闭...");
        })
        .context("设置 Ctrl+C 处理失败")?;

        println!(
            "🚗 驾驶循环: {} Hz, 部件 {:?}",
            config.drive.vehicle_hz,
            vehicle.part_names().collect::<Vec<_>>()
        );
        let summary = vehicle.start(&LoopConfig::from(&config.drive))?;
        let metrics = vehicle.metrics().snapshot();

        println!();
        println!("📊 执行结果:");
        println!("  循环次数: {}", summary.loop_count);
        println!("  耗时: {:.2} 秒", summary.elapsed.as_secs_f64());
        println!("  平均频率: {:.1} Hz", summary.effective_hz());
        println!("  超时 tick: {}", metrics.overruns);
        println!("  部件错误: {}", metrics.part_errors);
        tracing::debug!("Final metrics: {:?}", metrics);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> DriveCommand {
        DriveCommand {
            config: None,
            max_loops: None,
            vehicle_hz: None,
            verbose: false,
        }
    }

    #[test]
    fn test_overrides_apply_on_top_of_defaults() {
        let cmd = DriveCommand {
            max_loops: Some(7),
            vehicle_hz: Some(50.0),
            verbose: true,
            ..command()
        };
        let config = cmd.resolve_config().unwrap();
        assert_eq!(config.drive.max_loops, Some(7));
        assert_eq!(config.drive.vehicle_hz, 50.0);
        assert!(config.drive.verbose);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cmd = DriveCommand {
            max_loops: Some(0),
            ..command()
        };
        assert!(cmd.resolve_config().is_err());
    }
}
