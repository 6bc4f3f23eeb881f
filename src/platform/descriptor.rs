//! 平台描述符
//!
//! 窗口创建参数，在 `init` 时传入一次，平台上下文保留一份副本用于
//! 后续查询（当前尺寸、标题）。

use crate::core::error::{PlatformError, Result};

/// 窗口创建参数
///
/// # 示例
///
/// ```
/// use gunmetal::platform::PlatformDescriptor;
///
/// let desc = PlatformDescriptor::new("Simple Window", 800, 600)
///     .with_resizable(false);
/// assert_eq!(desc.size(), (800, 600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDescriptor {
    /// 窗口标题
    pub title: String,
    /// 宽度（像素）
    pub width: u32,
    /// 高度（像素）
    pub height: u32,
    /// 窗口管理器是否可以调整窗口大小
    pub resizable: bool,
    /// 是否以全屏方式创建
    pub fullscreen: bool,
}

impl PlatformDescriptor {
    /// 创建可调整大小、非全屏的描述符
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            resizable: true,
            fullscreen: false,
        }
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// 当前尺寸 `(width, height)`
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 检查描述符能否用于创建窗口
    pub fn validate(&self) -> Result<()> {
        validate_size(self.width, self.height)
    }
}

impl Default for PlatformDescriptor {
    fn default() -> Self {
        Self::new("Gunmetal", 800, 600)
    }
}

/// 窗口尺寸必须非零，且能放进 X11 的 16 位几何字段
pub(crate) fn validate_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(PlatformError::InvalidArgument(format!(
            "window size must be non-zero, got {}x{}",
            width, height
        )));
    }

    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(PlatformError::InvalidArgument(format!(
            "window size {}x{} exceeds {}",
            width,
            height,
            u16::MAX
        )));
    }

    Ok(())
}
