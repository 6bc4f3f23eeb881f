//! 表面句柄
//!
//! 图形层绑定渲染上下文所需的原生句柄与当前尺寸。
//! 句柄借用自 `Platform`，因此在它存活期间平台无法被 `shutdown`。

use std::marker::PhantomData;

use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, RawDisplayHandle,
    RawWindowHandle, WindowHandle,
};

use super::backend::BackendTag;

/// 只读的表面句柄快照
///
/// 无头后端没有原生句柄，此时 `display_handle`/`window_handle` 返回
/// `HandleError::Unavailable`。
#[derive(Debug, Clone, Copy)]
pub struct SurfaceHandle<'a> {
    display: Option<RawDisplayHandle>,
    window: Option<RawWindowHandle>,
    /// 产生句柄的后端
    pub backend: BackendTag,
    /// 宽度（像素）
    pub width: u32,
    /// 高度（像素）
    pub height: u32,
    _platform: PhantomData<&'a ()>,
}

impl<'a> SurfaceHandle<'a> {
    pub(crate) fn new(
        handles: Option<(RawDisplayHandle, RawWindowHandle)>,
        backend: BackendTag,
        (width, height): (u32, u32),
    ) -> Self {
        let (display, window) = match handles {
            Some((display, window)) => (Some(display), Some(window)),
            None => (None, None),
        };

        Self {
            display,
            window,
            backend,
            width,
            height,
            _platform: PhantomData,
        }
    }

    /// 原生显示连接
    pub fn raw_display(&self) -> Option<RawDisplayHandle> {
        self.display
    }

    /// 原生窗口
    pub fn raw_window(&self) -> Option<RawWindowHandle> {
        self.window
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl HasDisplayHandle for SurfaceHandle<'_> {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        let raw = self.display.ok_or(HandleError::Unavailable)?;
        // SAFETY: 连接由平台后端持有，SurfaceHandle 借用平台期间连接不会被关闭
        Ok(unsafe { DisplayHandle::borrow_raw(raw) })
    }
}

impl HasWindowHandle for SurfaceHandle<'_> {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        let raw = self.window.ok_or(HandleError::Unavailable)?;
        // SAFETY: 同上，窗口在借用期间不会被销毁
        Ok(unsafe { WindowHandle::borrow_raw(raw) })
    }
}
