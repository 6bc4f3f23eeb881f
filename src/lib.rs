//! Gunmetal - 2D 游戏的最小平台层
//!
//! 打开原生窗口、驱动事件队列、跟踪窗口生命周期，并向图形层提供
//! 与后端无关的表面句柄。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（日志、配置、错误处理）
//! - `platform`: 平台抽象层（门面、状态机、X11/winit/headless 后端）
//!
//! # 使用示例
//!
//! ```
//! use gunmetal::platform::{BackendTag, Platform, PlatformDescriptor};
//!
//! let (mut platform, _control) = Platform::headless();
//! platform.init(&PlatformDescriptor::new("T", 320, 240)).unwrap();
//! assert_eq!(platform.size().unwrap(), (320, 240));
//! assert_eq!(platform.backend_type(), BackendTag::Headless);
//!
//! platform.request_quit().unwrap();
//! assert!(!platform.running());
//! platform.shutdown();
//! ```

pub mod core;
pub mod platform;

/// 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 版本字符串，例如 "0.1.0"
pub fn version() -> &'static str {
    VERSION
}

/// 版本号的 (major, minor, patch) 三元组
pub fn version_parts() -> (u32, u32, u32) {
    let parse = |s: &str| s.parse::<u32>().unwrap_or(0);
    (
        parse(env!("CARGO_PKG_VERSION_MAJOR")),
        parse(env!("CARGO_PKG_VERSION_MINOR")),
        parse(env!("CARGO_PKG_VERSION_PATCH")),
    )
}
