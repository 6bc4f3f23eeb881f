//! winit 后端
//!
//! 通过 winit 访问 X11 或 Wayland。winit 的事件循环使用 `pump_events`
//! 以零超时方式驱动，从而不阻塞宿主的游戏循环。
//!
//! winit 不允许在同一进程中重新创建事件循环，因此事件循环在第一次 `open`
//! 时创建并一直保留到后端被丢弃；`close` 只销毁窗口。

use std::time::Duration;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowBuilder};

use super::backend::{wayland_session_detected, BackendTag, NativeBackend};
use super::descriptor::PlatformDescriptor;
use super::event::{KeyCode, NativeEvent};
use crate::core::error::{PlatformError, Result};
use crate::{platform_debug, platform_info, platform_warn};

/// winit 后端
pub struct WinitBackend {
    tag: BackendTag,
    event_loop: Option<EventLoop<()>>,
    window: Option<Window>,
}

impl WinitBackend {
    /// 创建后端，此时还没有创建事件循环
    ///
    /// 后端类别按 winit 的会话选择规则确定：存在 Wayland 会话时为 Wayland。
    pub fn new() -> Self {
        let tag = if wayland_session_detected() {
            BackendTag::Wayland
        } else if cfg!(all(unix, not(target_os = "macos"))) {
            BackendTag::X11
        } else {
            BackendTag::Unknown
        };

        Self {
            tag,
            event_loop: None,
            window: None,
        }
    }

    fn window(&self) -> Result<&Window> {
        self.window
            .as_ref()
            .ok_or_else(|| PlatformError::Native("winit window is not open".to_string()))
    }
}

impl Default for WinitBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn translate_key(physical_key: PhysicalKey) -> KeyCode {
    match physical_key {
        PhysicalKey::Code(WinitKeyCode::Escape) => KeyCode::Escape,
        _ => KeyCode::Unidentified,
    }
}

/// 显示句柄实际对应的后端类别
fn display_tag(display: &RawDisplayHandle) -> BackendTag {
    match display {
        RawDisplayHandle::Wayland(_) => BackendTag::Wayland,
        RawDisplayHandle::Xlib(_) | RawDisplayHandle::Xcb(_) => BackendTag::X11,
        _ => BackendTag::Unknown,
    }
}

/// 把 winit 窗口事件翻译为 [`NativeEvent`]
fn translate(event: &WindowEvent) -> NativeEvent {
    match event {
        WindowEvent::CloseRequested => NativeEvent::CloseRequested,
        WindowEvent::KeyboardInput { event, .. } => {
            let key = translate_key(event.physical_key);
            match event.state {
                ElementState::Pressed => NativeEvent::KeyPressed(key),
                ElementState::Released => NativeEvent::KeyReleased(key),
            }
        }
        WindowEvent::Resized(size) => NativeEvent::Resized {
            width: size.width,
            height: size.height,
        },
        WindowEvent::RedrawRequested => NativeEvent::Exposed,
        WindowEvent::MouseInput { .. }
        | WindowEvent::CursorMoved { .. }
        | WindowEvent::MouseWheel { .. } => NativeEvent::Pointer,
        _ => NativeEvent::Other,
    }
}

impl NativeBackend for WinitBackend {
    fn tag(&self) -> BackendTag {
        self.tag
    }

    fn name(&self) -> &str {
        "winit"
    }

    fn open(&mut self, desc: &PlatformDescriptor) -> Result<()> {
        if self.window.is_some() {
            return Err(PlatformError::AlreadyInitialized);
        }

        if self.event_loop.is_none() {
            let event_loop = EventLoop::new().map_err(|e| {
                platform_warn!(error = %e, "Failed to create winit event loop");
                PlatformError::ResourceUnavailable(e.to_string())
            })?;
            platform_debug!("winit event loop created");
            self.event_loop = Some(event_loop);
        }

        let event_loop = self
            .event_loop
            .as_ref()
            .ok_or_else(|| PlatformError::ResourceUnavailable("no winit event loop".to_string()))?;

        let fullscreen = desc.fullscreen.then_some(Fullscreen::Borderless(None));
        let window = WindowBuilder::new()
            .with_title(desc.title.as_str())
            .with_inner_size(PhysicalSize::new(desc.width, desc.height))
            .with_resizable(desc.resizable)
            .with_fullscreen(fullscreen)
            .with_visible(true)
            .build(event_loop)
            .map_err(|e| {
                platform_warn!(error = %e, "Failed to create winit window");
                PlatformError::CreationFailure(e.to_string())
            })?;

        platform_info!(id = ?window.id(), tag = %self.tag, "winit window created");

        // 后端类别在构造时按会话推断，winit 可能回退到另一种显示协议
        if let Ok(display) = window.display_handle() {
            let actual = display_tag(&display.as_raw());
            if actual != self.tag {
                platform_warn!(
                    expected = %self.tag,
                    actual = %actual,
                    "winit selected a different display protocol than detected"
                );
            }
        }

        self.window = Some(window);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(window) = self.window.take() {
            platform_debug!(id = ?window.id(), "winit window destroyed");
        }
    }

    fn is_open(&self) -> bool {
        self.window.is_some()
    }

    fn pump_events(&mut self, out: &mut Vec<NativeEvent>) -> Result<()> {
        let window_id = self.window()?.id();
        let event_loop = self
            .event_loop
            .as_mut()
            .ok_or_else(|| PlatformError::Native("no winit event loop".to_string()))?;

        let status = event_loop.pump_events(Some(Duration::ZERO), |event, _| {
            if let Event::WindowEvent { window_id: id, event } = event {
                if id == window_id {
                    out.push(translate(&event));
                }
            }
        });

        if let PumpStatus::Exit(code) = status {
            platform_warn!(code, "winit event loop exited");
        }

        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        self.window()?.set_title(title);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<Option<(u32, u32)>> {
        // Some 表示尺寸已经立即生效（Wayland），之后不会再有 Resized 事件
        let applied = self
            .window()?
            .request_inner_size(PhysicalSize::new(width, height))
            .map(|size| (size.width, size.height));
        Ok(applied)
    }

    fn raw_handles(&self) -> Option<(RawDisplayHandle, RawWindowHandle)> {
        let window = self.window.as_ref()?;
        let display = window.display_handle().ok()?.as_raw();
        let handle = window.window_handle().ok()?.as_raw();
        Some((display, handle))
    }
}
