//! 错误处理模块
//!
//! 定义了平台层使用的统一错误类型。
//!
//! # 错误分类
//!
//! - `ResourceUnavailable`：无法打开原生显示连接
//! - `CreationFailure`：连接已打开但窗口创建失败（连接在返回前已释放）
//! - `InvalidArgument`：描述符或尺寸参数无效
//! - `AlreadyInitialized`：在已初始化的上下文上再次调用 `init`
//! - `NotReady`：当前生命周期状态不允许该操作
//!
//! 所有失败都通过返回值传递，平台层从不 panic 或终止进程。

use std::fmt;

use crate::platform::Lifecycle;

/// 平台层统一的 Result 类型
pub type Result<T> = std::result::Result<T, PlatformError>;

/// 平台层的错误类型
#[derive(Debug)]
pub enum PlatformError {
    /// 原生显示连接无法打开
    ResourceUnavailable(String),

    /// 窗口对象创建失败
    CreationFailure(String),

    /// 参数无效（描述符缺失字段、零尺寸等）
    InvalidArgument(String),

    /// 上下文已经初始化
    AlreadyInitialized,

    /// 当前状态不允许执行该操作
    NotReady {
        operation: &'static str,
        lifecycle: Lifecycle,
    },

    /// 已打开窗口上的原生请求失败
    Native(String),

    /// 配置错误
    Config(ConfigError),

    /// IO 错误
    Io(std::io::Error),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

impl PlatformError {
    /// 构造 `NotReady` 错误
    pub(crate) fn not_ready(operation: &'static str, lifecycle: Lifecycle) -> Self {
        PlatformError::NotReady { operation, lifecycle }
    }

    /// 是否为状态不匹配导致的错误
    pub fn is_not_ready(&self) -> bool {
        matches!(self, PlatformError::NotReady { .. })
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::ResourceUnavailable(msg) => {
                write!(f, "Display connection unavailable: {}", msg)
            }
            PlatformError::CreationFailure(msg) => write!(f, "Window creation failed: {}", msg),
            PlatformError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            PlatformError::AlreadyInitialized => write!(f, "Platform is already initialized"),
            PlatformError::NotReady { operation, lifecycle } => {
                write!(f, "Cannot {} while platform is {:?}", operation, lifecycle)
            }
            PlatformError::Native(msg) => write!(f, "Native request failed: {}", msg),
            PlatformError::Config(e) => write!(f, "Configuration error: {}", e),
            PlatformError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlatformError::Io(e) => Some(e),
            PlatformError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for PlatformError {
    fn from(err: std::io::Error) -> Self {
        PlatformError::Io(err)
    }
}

impl From<ConfigError> for PlatformError {
    fn from(err: ConfigError) -> Self {
        PlatformError::Config(err)
    }
}
