//! # Rover CLI
//!
//! Command-line interface for rover drive loops.
//!
//! ```bash
//! # 生成默认配置并校验
//! rover-cli config init vehicle.toml
//! rover-cli config check vehicle.toml
//!
//! # 查看生效配置
//! rover-cli config show vehicle.toml --format json
//!
//! # 用仿真部件运行驾驶循环（Ctrl+C 停止）
//! rover-cli drive --config vehicle.toml --max-loops 200
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ConfigCommand, DriveCommand};

/// Rover CLI - 驾驶循环命令行工具
#[derive(Parser, Debug)]
#[command(name = "rover-cli")]
#[command(about = "Command-line interface for rover drive loops", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 运行仿真驾驶循环
    Drive {
        #[command(flatten)]
        args: DriveCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志（RUST_LOG 优先）
    rover_sdk::init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),
        Commands::Drive { args } => args.execute(),
    }
}
