//! 日志系统模块
//!
//! 基于 `tracing` 提供结构化的日志记录功能。
//! 平台层内部统一使用 `platform_*!` 宏（target `gunmetal::platform`），
//! 宿主程序使用 `app_*!` 宏，并在启动时调用一次 [`init_logger`]。
//!
//! # 使用示例
//!
//! ```no_run
//! use gunmetal::core::{log, LogLevel};
//!
//! log::init_logger(LogLevel::Info, false, None);
//! gunmetal::app_info!(width = 800, height = 600, "Window created");
//! ```

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use super::config::LogLevel;

/// 日志级别对应的过滤指令
fn filter_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

/// 初始化日志系统
///
/// 必须在程序开始时调用一次。`RUST_LOG` 环境变量存在时优先于 `level`。
///
/// # 参数
///
/// * `level` - 日志级别
/// * `file_output` - 是否同时输出到文件
/// * `log_file_path` - 日志文件路径（可选，默认为 "gunmetal.log"）
pub fn init_logger(level: LogLevel, file_output: bool, log_file_path: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    if file_output {
        let log_path = log_file_path.unwrap_or("gunmetal.log");
        let path = Path::new(log_path);
        let directory = path.parent().unwrap_or(Path::new("."));
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("gunmetal.log");

        // 每天滚动
        let file_appender = RollingFileAppender::new(Rotation::DAILY, directory, filename);

        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_ansi(true);

        let file_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_ansi(false)
            .with_writer(file_appender);

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init();
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(true);

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
    }
}

/// 平台层日志 - Debug 级别
#[macro_export]
macro_rules! platform_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "gunmetal::platform", $($arg)*)
    };
}

/// 平台层日志 - Info 级别
#[macro_export]
macro_rules! platform_info {
    ($($arg:tt)*) => {
        tracing::info!(target: "gunmetal::platform", $($arg)*)
    };
}

/// 平台层日志 - Warn 级别
#[macro_export]
macro_rules! platform_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "gunmetal::platform", $($arg)*)
    };
}

/// 平台层日志 - Error 级别
#[macro_export]
macro_rules! platform_error {
    ($($arg:tt)*) => {
        tracing::error!(target: "gunmetal::platform", $($arg)*)
    };
}

/// 应用层日志 - Info 级别
#[macro_export]
macro_rules! app_info {
    ($($arg:tt)*) => {
        tracing::info!(target: "gunmetal::app", $($arg)*)
    };
}

/// 应用层日志 - Warn 级别
#[macro_export]
macro_rules! app_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "gunmetal::app", $($arg)*)
    };
}
