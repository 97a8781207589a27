//! 日志初始化

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 未设置 `RUST_LOG` 时使用的日志级别
pub fn default_level(config: &Config) -> &'static str {
    if config.verbose_logging {
        "debug"
    } else {
        "info"
    }
}

/// 初始化全局日志
///
/// `RUST_LOG` 优先；否则根据 `config.verbose_logging` 选择 debug 或 info
pub fn init(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(config)));

    // 测试中可能被多次调用，忽略重复初始化
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
