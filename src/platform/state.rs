//! 窗口状态与事件归约
//!
//! 生命周期状态机：
//!
//! ```text
//!                 init 成功
//! Uninitialized ───────────► Running
//!       ▲                      │ 关闭请求 / Escape / request_quit
//!       │ shutdown             ▼
//!       └──────────────── ShuttingDown
//! ```
//!
//! `Running` 与 `ShuttingDown` 两个状态下后端都持有有效的连接和窗口；
//! 只有 `shutdown` 会释放它们。

use super::descriptor::PlatformDescriptor;
use super::event::NativeEvent;

/// 平台生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// 未初始化，没有任何原生资源
    Uninitialized,
    /// 窗口已创建并处于运行状态
    Running,
    /// 已观察到退出请求，窗口仍然存在，等待 `shutdown`
    ShuttingDown,
}

impl Lifecycle {
    /// 后端是否持有连接与窗口
    pub fn holds_window(&self) -> bool {
        !matches!(self, Lifecycle::Uninitialized)
    }
}

/// 单个事件归约后的效果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// 停止运行
    Quit,
    /// 尺寸已更新
    Resized,
    /// 无效果
    Ignored,
}

/// 平台上下文持有的窗口状态
#[derive(Debug)]
pub struct WindowState {
    lifecycle: Lifecycle,
    descriptor: Option<PlatformDescriptor>,
}

impl WindowState {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Uninitialized,
            descriptor: None,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    pub fn descriptor(&self) -> Option<&PlatformDescriptor> {
        self.descriptor.as_ref()
    }

    pub(crate) fn descriptor_mut(&mut self) -> Option<&mut PlatformDescriptor> {
        self.descriptor.as_mut()
    }

    /// Uninitialized → Running
    pub(crate) fn start(&mut self, descriptor: PlatformDescriptor) {
        self.descriptor = Some(descriptor);
        self.lifecycle = Lifecycle::Running;
    }

    /// Running → ShuttingDown；其他状态不变
    pub(crate) fn request_quit(&mut self) {
        if self.lifecycle == Lifecycle::Running {
            self.lifecycle = Lifecycle::ShuttingDown;
        }
    }

    /// 任意状态 → Uninitialized
    pub(crate) fn reset(&mut self) {
        self.lifecycle = Lifecycle::Uninitialized;
        self.descriptor = None;
    }

    /// 把一个原生事件归约到状态上
    ///
    /// 事件必须按到达顺序传入：同一字段上后到的事件覆盖先到的。
    /// 只有真正发生 Running → ShuttingDown 时才返回 [`Reduction::Quit`]。
    pub fn apply(&mut self, event: &NativeEvent) -> Reduction {
        if event.requests_quit() {
            if !self.running() {
                return Reduction::Ignored;
            }
            self.request_quit();
            return Reduction::Quit;
        }

        match *event {
            NativeEvent::Resized { width, height } => match self.descriptor.as_mut() {
                Some(desc) => {
                    desc.width = width;
                    desc.height = height;
                    Reduction::Resized
                }
                None => Reduction::Ignored,
            },
            _ => Reduction::Ignored,
        }
    }
}

impl Default for WindowState {
    fn default() -> Self {
        Self::new()
    }
}
