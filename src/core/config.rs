//! 配置管理模块
//!
//! 提供平台层配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (gunmetal.toml)
//!
//! ```toml
//! [window]
//! title = "Gunmetal"
//! width = 800
//! height = 600
//! resizable = true
//! fullscreen = false
//!
//! [platform]
//! backend = "auto"    # auto, x11, winit, headless
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Result};
use crate::platform::{BackendKind, PlatformDescriptor};

/// 平台层配置
///
/// 可以从配置文件加载，也可以通过代码构建。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 平台后端配置
    #[serde(default)]
    pub platform: PlatformConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,

    /// 窗口宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 是否可调整大小
    #[serde(default = "default_resizable")]
    pub resizable: bool,

    /// 是否全屏
    #[serde(default)]
    pub fullscreen: bool,
}

/// 平台后端配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// 原生后端选择
    #[serde(default)]
    pub backend: BackendKind,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_title() -> String { "Gunmetal".to_string() }
fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_resizable() -> bool { true }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_log_file() -> String { "gunmetal.log".to_string() }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            resizable: default_resizable(),
            fullscreen: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_file: default_log_file(),
        }
    }
}

impl From<&WindowConfig> for PlatformDescriptor {
    fn from(window: &WindowConfig) -> Self {
        PlatformDescriptor::new(window.title.clone(), window.width, window.height)
            .with_resizable(window.resizable)
            .with_fullscreen(window.fullscreen)
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use gunmetal::core::Config;
    ///
    /// let config = Config::from_file("gunmetal.toml")?;
    /// # Ok::<(), gunmetal::core::PlatformError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在或无法解析则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--backend <auto|x11|winit|headless>`: 选择原生后端
    /// - `--headless`: 等价于 `--backend headless`
    /// - `--width <value>` / `--height <value>`: 设置窗口尺寸
    /// - `--title <value>`: 设置窗口标题
    /// - `--fullscreen`: 全屏
    /// - `--fixed-size`: 禁止窗口管理器调整大小
    ///
    /// 无法解析的值会被忽略。
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|idx| args.get(idx + 1))
        };

        if let Some(kind) = value_of("--backend").and_then(|v| v.parse().ok()) {
            self.platform.backend = kind;
        }

        if args.iter().any(|a| a == "--headless") {
            self.platform.backend = BackendKind::Headless;
        }

        if let Some(width) = value_of("--width").and_then(|v| v.parse().ok()) {
            self.window.width = width;
        }

        if let Some(height) = value_of("--height").and_then(|v| v.parse().ok()) {
            self.window.height = height;
        }

        if let Some(title) = value_of("--title") {
            self.window.title = title.clone();
        }

        if args.iter().any(|a| a == "--fullscreen") {
            self.window.fullscreen = true;
        }

        if args.iter().any(|a| a == "--fixed-size") {
            self.window.resizable = false;
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Window dimensions must be greater than 0".to_string(),
            }
            .into());
        }

        // X11 的窗口几何字段是 16 位
        if self.window.width > u16::MAX as u32 || self.window.height > u16::MAX as u32 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: format!("Window dimensions must not exceed {}", u16::MAX),
            }
            .into());
        }

        Ok(())
    }

    /// 由窗口配置生成平台描述符
    pub fn descriptor(&self) -> PlatformDescriptor {
        PlatformDescriptor::from(&self.window)
    }
}
