//! 核心功能模块
//!
//! 本模块提供平台层的基础设施：日志系统、配置管理和错误处理。
//! 这些模块独立于具体的窗口系统后端。
//!
//! # 模块组织
//!
//! - `log`：日志系统，基于 `tracing`
//! - `config`：配置管理，支持从 TOML 文件加载并由命令行覆盖
//! - `error`：错误处理，定义统一的错误类型

pub mod config;
pub mod error;
pub mod log;

// 重新导出常用类型，方便使用
pub use config::{Config, LogLevel, LoggingConfig, PlatformConfig, WindowConfig};
pub use error::{ConfigError, PlatformError, Result};
