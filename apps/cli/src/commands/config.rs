//! 配置管理命令
//!
//! 生成、校验和查看车辆配置文件

use anyhow::{Context, Result, bail};
use clap::{Subcommand, ValueEnum};
use rover_sdk::VehicleConfig;
use std::path::{Path, PathBuf};

/// 输出格式
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Toml,
    Json,
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写出默认配置
    Init {
        /// 目标文件
        path: PathBuf,

        /// 覆盖已存在的文件
        #[arg(short, long)]
        force: bool,
    },

    /// 校验配置文件
    Check {
        /// 配置文件
        path: PathBuf,
    },

    /// 打印生效配置（未指定文件时打印默认配置）
    Show {
        /// 配置文件
        path: Option<PathBuf>,

        /// 输出格式
        #[arg(short, long, value_enum, default_value_t = Format::Toml)]
        format: Format,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Init { path, force } => Self::init_(&path, force),
            ConfigCommand::Check { path } => Self::check_(&path),
            ConfigCommand::Show { path, format } => Self::show_(path.as_deref(), format),
        }
    }

    fn init_(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!(
                "{} already exists, pass --force to overwrite",
                path.display()
            );
        }
        VehicleConfig::default()
            .save_to_file(path)
            .context("写入默认配置失败")?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }

    fn check_(path: &Path) -> Result<()> {
        let config = load(path)?;

        println!("✅ {} is valid", path.display());
        println!("  主循环频率: {} Hz", config.drive.vehicle_hz);
        println!("  检测频率: {} Hz", config.detector.run_hz);
        let labels = config.enabled_labels();
        if labels.is_empty() {
            println!("  已启用动作: (无)");
        } else {
            println!("  已启用动作: {}", labels.join(", "));
        }
        Ok(())
    }

    fn show_(path: Option<&Path>, format: Format) -> Result<()> {
        let config = match path {
            Some(path) => load(path)?,
            None => VehicleConfig::default(),
        };

        let rendered = match format {
            Format::Toml => config.to_toml_string()?,
            Format::Json => serde_json::to_string_pretty(&config)?,
        };
        println!("{}", rendered.trim_end());
        Ok(())
    }
}

/// 加载并校验配置文件
pub fn load(path: &Path) -> Result<VehicleConfig> {
    VehicleConfig::load_from_file(path)
        .with_context(|| format!("配置文件无效: {}", path.display()))
}
