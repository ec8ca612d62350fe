//! 日志初始化和配置模块
//!
//! 这个模块提供了统一的日志初始化功能，使用 tracing 库。
//! 控制台输出与按天滚动的文件输出都由 [`LogConfig`] 控制。

use crate::config::LogConfig;
use std::io;
use std::sync::OnceLock;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// 文件日志的 guard，进程生命周期内保持存活
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),
    #[error("日志配置错误: {0}")]
    Config(String),
}

/// 日志初始化结果
pub type LogResult<T> = Result<T, LogError>;

/// 解析日志级别字符串
pub fn parse_level(level: &str) -> LogResult<Level> {
    level
        .parse::<Level>()
        .map_err(|_| LogError::Config(format!("无效的日志级别: {level}")))
}

/// 初始化日志系统
///
/// - `RUST_LOG` 存在时优先使用环境变量过滤器
/// - `enable_stdout` 为 true 时输出到控制台
/// - `log_dir` 非空时按天滚动写入 `log_dir/user-ingest.<日期>`
///
/// 重复初始化不会报错，第一次成功的配置生效。
///
/// # Examples
///
/// ```no_run
/// use user_ingest::config::LogConfig;
/// use user_ingest::logging::init_logging;
///
/// init_logging(&LogConfig::default()).unwrap();
/// ```
pub fn init_logging(config: &LogConfig) -> LogResult<()> {
    let level = parse_level(&config.level)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let console_layer = config.enable_stdout.then(|| {
        fmt::layer()
            .with_timer(SystemTime)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_ansi(true)
    });

    let mut guard = None;
    let file_layer = if config.log_dir.trim().is_empty() {
        None
    } else {
        std::fs::create_dir_all(&config.log_dir)?;
        let file_appender = tracing_appender::rolling::daily(&config.log_dir, "user-ingest");
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);
        Some(
            fmt::layer()
                .with_writer(non_blocking)
                .with_timer(SystemTime)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_ansi(false),
        )
    };

    let subscriber = Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);

    // 已经初始化过不是错误
    if subscriber.try_init().is_ok() {
        if let Some(file_guard) = guard {
            let _ = FILE_GUARD.set(file_guard);
        }
        tracing::info!(
            "日志系统初始化完成 - 级别: {}, 控制台: {}, 目录: {}",
            level,
            config.enable_stdout,
            config.log_dir
        );
    }

    Ok(())
}

/// 使用默认配置初始化日志系统（仅控制台，INFO 级别）
pub fn init_default_logging() -> LogResult<()> {
    init_logging(&LogConfig::default())
}
