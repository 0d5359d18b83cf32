//! 命令定义和实现

pub mod config;
pub mod drive;

pub use config::ConfigCommand;
pub use drive::DriveCommand;
