//! 日志初始化
//!
//! `RUST_LOG` 优先；未设置时使用配置文件里的级别，再按命令行 `-v` 次数提升。

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` 未设置时使用的过滤指令
pub fn default_filter(config: &LoggingConfig, verbosity: u8) -> &'static str {
    config.level.raised_by(verbosity).as_filter()
}

/// 安装全局 subscriber，已安装过时返回 `false`
pub fn init_logging(config: &LoggingConfig, verbosity: u8) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config, verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(config.thread_names)
        .with_target(true)
        .try_init()
        .is_ok()
}
