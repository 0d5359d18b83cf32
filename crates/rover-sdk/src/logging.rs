//! 日志初始化
//!
//! 安装 `tracing-subscriber` fmt 订阅器（`RUST_LOG` 优先），并把 `log` crate 的记录
//! 桥接到 tracing。重复调用无副作用。

use tracing_subscriber::EnvFilter;

/// 默认过滤规则
pub const DEFAULT_FILTER: &str = "info";

/// 使用默认过滤规则初始化日志
pub fn init_logger() -> bool {
    init_logger_with(DEFAULT_FILTER)
}

/// 初始化日志
///
/// 设置了 `RUST_LOG` 时使用环境变量，否则使用 `filter`。
/// 返回本次调用是否安装了全局订阅器（已安装过时返回 `false`）。
pub fn init_logger_with(filter: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }
    // log 记录的级别过滤由 EnvFilter 完成
    if let Err(e) = tracing_log::LogTracer::init_with_filter(log::LevelFilter::Trace) {
        tracing::debug!("log bridge already installed: {}", e);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_is_idempotent() {
        let _ = init_logger_with("debug");
        assert!(!init_logger());
        log::info!("bridged log record");
        tracing::info!("tracing record");
    }
}
