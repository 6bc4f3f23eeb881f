//! 原生后端的统一抽象接口
//!
//! 本模块定义了所有原生窗口系统后端（X11、winit、headless）必须实现的统一接口。
//! 平台门面只通过这个接口访问原生资源，生命周期状态机和事件归约都在门面中完成，
//! 后端只负责：
//!
//! - 打开/关闭显示连接与窗口（原子操作）
//! - 把原生事件翻译成 [`NativeEvent`]
//! - 执行标题、尺寸等原生请求
//! - 提供原始句柄给图形层

use std::fmt;
use std::str::FromStr;

use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use serde::{Deserialize, Serialize};

use super::descriptor::PlatformDescriptor;
use super::event::NativeEvent;
use super::headless::HeadlessBackend;
use super::winit_backend::WinitBackend;
use crate::core::error::{PlatformError, Result};
use crate::platform_info;

/// 产生表面句柄的后端类别
///
/// 图形层据此选择自己的原生入口（例如 Xlib/XCB 还是 Wayland 的表面创建函数）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendTag {
    #[default]
    Unknown,
    X11,
    Wayland,
    Headless,
}

impl BackendTag {
    pub fn name(&self) -> &'static str {
        match self {
            BackendTag::Unknown => "Unknown",
            BackendTag::X11 => "X11",
            BackendTag::Wayland => "Wayland",
            BackendTag::Headless => "Headless",
        }
    }
}

impl fmt::Display for BackendTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 后端选择（配置项）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Wayland 会话下使用 winit，否则使用 X11
    #[default]
    Auto,
    /// 直接使用 X11 协议
    X11,
    /// 使用 winit（X11 或 Wayland）
    Winit,
    /// 不连接任何显示服务器
    Headless,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Auto => "auto",
            BackendKind::X11 => "x11",
            BackendKind::Winit => "winit",
            BackendKind::Headless => "headless",
        }
    }

    /// 把 `Auto` 解析为具体后端
    pub fn resolve(self) -> BackendKind {
        match self {
            BackendKind::Auto if wayland_session_detected() => BackendKind::Winit,
            BackendKind::Auto if cfg!(all(unix, not(target_os = "macos"))) => BackendKind::X11,
            BackendKind::Auto => BackendKind::Winit,
            other => other,
        }
    }
}

impl FromStr for BackendKind {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendKind::Auto),
            "x11" => Ok(BackendKind::X11),
            "winit" => Ok(BackendKind::Winit),
            "headless" => Ok(BackendKind::Headless),
            other => Err(PlatformError::InvalidArgument(format!(
                "unknown backend '{}'",
                other
            ))),
        }
    }
}

/// 当前进程是否运行在 Wayland 会话中
pub fn wayland_session_detected() -> bool {
    cfg!(all(unix, not(target_os = "macos")))
        && std::env::var_os("WAYLAND_DISPLAY").is_some_and(|v| !v.is_empty())
}

/// 原生后端的统一接口
///
/// # 约定
///
/// - `open` 是原子的：成功后连接和窗口都存在；失败时两者都不存在。
///   如果窗口创建失败，之前打开的连接必须在返回前关闭。
/// - `close` 是幂等的，在未打开时调用不做任何事。
/// - `pump_events` 不阻塞：只取出当前已排队的事件，按到达顺序追加到 `out`。
///   返回错误之前已经追加到 `out` 的事件仍然有效，门面会照常归约。
/// - 其余方法只会在 `is_open()` 为真时被门面调用。
pub trait NativeBackend {
    /// 后端类别，在后端的整个生命周期内保持不变
    fn tag(&self) -> BackendTag;

    /// 后端名称，用于日志输出
    fn name(&self) -> &str;

    /// 打开显示连接并创建、显示窗口
    fn open(&mut self, desc: &PlatformDescriptor) -> Result<()>;

    /// 销毁窗口并关闭连接
    fn close(&mut self);

    /// 是否持有连接与窗口
    fn is_open(&self) -> bool;

    /// 取出所有已排队的原生事件
    ///
    /// 返回后 `out` 末尾追加了翻译后的事件，最早到达的在前。
    fn pump_events(&mut self, out: &mut Vec<NativeEvent>) -> Result<()>;

    /// 设置窗口标题
    fn set_title(&mut self, title: &str) -> Result<()>;

    /// 调整原生窗口尺寸
    ///
    /// 如果原生系统立即应用了尺寸（可能与请求不同），返回实际尺寸；
    /// 返回 `None` 表示实际尺寸稍后通过 `Resized` 事件报告。
    fn resize(&mut self, width: u32, height: u32) -> Result<Option<(u32, u32)>>;

    /// 原生连接与窗口的原始句柄
    fn raw_handles(&self) -> Option<(RawDisplayHandle, RawWindowHandle)>;
}

/// 根据配置创建原生后端
///
/// `Auto` 在 Wayland 会话中选择 winit，其余情况选择 X11。
/// 创建后端本身不会打开显示连接，连接在 `Platform::init` 时建立。
pub fn create_backend(kind: BackendKind) -> Result<Box<dyn NativeBackend>> {
    let resolved = kind.resolve();
    platform_info!(requested = kind.name(), resolved = resolved.name(), "Selecting platform backend");

    match resolved {
        BackendKind::X11 => create_x11_backend(),
        BackendKind::Headless => Ok(Box::new(HeadlessBackend::new())),
        // resolve 不会返回 Auto
        BackendKind::Winit | BackendKind::Auto => Ok(Box::new(WinitBackend::new())),
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn create_x11_backend() -> Result<Box<dyn NativeBackend>> {
    Ok(Box::new(super::x11::X11Backend::new()))
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn create_x11_backend() -> Result<Box<dyn NativeBackend>> {
    Err(PlatformError::ResourceUnavailable(
        "the X11 backend is not available on this platform".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("x11".parse::<BackendKind>().unwrap(), BackendKind::X11);
        assert_eq!("Headless".parse::<BackendKind>().unwrap(), BackendKind::Headless);
        assert!("cocoa".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_resolve_keeps_explicit_kind() {
        assert_eq!(BackendKind::Headless.resolve(), BackendKind::Headless);
        assert_eq!(BackendKind::Winit.resolve(), BackendKind::Winit);
        assert_ne!(BackendKind::Auto.resolve(), BackendKind::Auto);
    }

    #[test]
    fn test_factory_headless() {
        let backend = create_backend(BackendKind::Headless).unwrap();
        assert_eq!(backend.tag(), BackendTag::Headless);
        assert!(!backend.is_open());
        assert!(backend.raw_handles().is_none());
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(BackendTag::X11.to_string(), "X11");
        assert_eq!(BackendTag::default(), BackendTag::Unknown);
    }
}
