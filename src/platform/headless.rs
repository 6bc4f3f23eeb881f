//! 无头后端
//!
//! 不连接任何显示服务器，只模拟连接和窗口的生命周期。
//! 通过 [`HeadlessControl`] 可以从外部注入合成事件、模拟连接或窗口创建失败，
//! 主要用于测试以及没有显示服务器的 CI 环境。

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use super::backend::{BackendTag, NativeBackend};
use super::descriptor::PlatformDescriptor;
use super::event::NativeEvent;
use crate::core::error::{PlatformError, Result};
use crate::platform_debug;

#[derive(Debug, Default)]
struct Shared {
    queue: VecDeque<NativeEvent>,
    fail_connect: bool,
    fail_window: bool,
    fail_pump: bool,
    size_limit: Option<(u32, u32)>,
    open_connections: usize,
    window: Option<SimulatedWindow>,
    native_calls: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SimulatedWindow {
    id: u32,
    title: String,
    width: u32,
    height: u32,
    resizable: bool,
    fullscreen: bool,
}

/// 无头后端的外部控制句柄
///
/// 可以在把后端交给 `Platform` 之前克隆出来，之后继续用它注入事件和观察状态。
#[derive(Debug, Clone)]
pub struct HeadlessControl {
    shared: Rc<RefCell<Shared>>,
}

impl HeadlessControl {
    /// 注入一个合成事件，下一次 `poll_events` 时被取出
    pub fn push_event(&self, event: NativeEvent) {
        self.shared.borrow_mut().queue.push_back(event);
    }

    /// 按顺序注入多个事件
    pub fn push_events<I: IntoIterator<Item = NativeEvent>>(&self, events: I) {
        self.shared.borrow_mut().queue.extend(events);
    }

    /// 尚未被取出的事件数量
    pub fn pending_events(&self) -> usize {
        self.shared.borrow().queue.len()
    }

    /// 让后续的 `open` 在打开连接时失败
    pub fn fail_connect(&self, fail: bool) {
        self.shared.borrow_mut().fail_connect = fail;
    }

    /// 让后续的 `open` 在连接成功后创建窗口时失败
    pub fn fail_window(&self, fail: bool) {
        self.shared.borrow_mut().fail_window = fail;
    }

    /// 让后续的事件泵在取出所有已排队事件之后返回错误
    pub fn fail_pump(&self, fail: bool) {
        self.shared.borrow_mut().fail_pump = fail;
    }

    /// 模拟窗口管理器的最大尺寸，`resize` 会把请求的尺寸限制在此范围内
    pub fn limit_size(&self, limit: Option<(u32, u32)>) {
        self.shared.borrow_mut().size_limit = limit;
    }

    /// 当前持有的模拟连接数（0 或 1）
    pub fn open_connections(&self) -> usize {
        self.shared.borrow().open_connections
    }

    /// 模拟窗口是否存在
    pub fn has_window(&self) -> bool {
        self.shared.borrow().window.is_some()
    }

    /// 模拟窗口的标题
    pub fn window_title(&self) -> Option<String> {
        self.shared.borrow().window.as_ref().map(|w| w.title.clone())
    }

    /// 模拟窗口的尺寸
    pub fn window_size(&self) -> Option<(u32, u32)> {
        self.shared.borrow().window.as_ref().map(|w| (w.width, w.height))
    }

    /// 模拟窗口是否允许调整大小
    pub fn window_resizable(&self) -> Option<bool> {
        self.shared.borrow().window.as_ref().map(|w| w.resizable)
    }

    /// 模拟窗口是否以全屏方式创建
    pub fn window_fullscreen(&self) -> bool {
        self.shared.borrow().window.as_ref().is_some_and(|w| w.fullscreen)
    }

    /// 窗口打开期间后端收到的原生请求次数（标题、尺寸、事件泵）
    pub fn native_calls(&self) -> usize {
        self.shared.borrow().native_calls
    }
}

/// 无头后端
#[derive(Debug)]
pub struct HeadlessBackend {
    shared: Rc<RefCell<Shared>>,
    next_window_id: u32,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared::default())),
            next_window_id: 1,
        }
    }

    /// 创建后端以及与之共享状态的控制句柄
    pub fn with_control() -> (Self, HeadlessControl) {
        let backend = Self::new();
        let control = backend.control();
        (backend, control)
    }

    pub fn control(&self) -> HeadlessControl {
        HeadlessControl {
            shared: Rc::clone(&self.shared),
        }
    }

    fn with_window<T>(&mut self, f: impl FnOnce(&mut SimulatedWindow) -> T) -> Result<T> {
        let mut shared = self.shared.borrow_mut();
        shared.native_calls += 1;
        shared
            .window
            .as_mut()
            .map(f)
            .ok_or_else(|| PlatformError::Native("headless window is not open".to_string()))
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBackend for HeadlessBackend {
    fn tag(&self) -> BackendTag {
        BackendTag::Headless
    }

    fn name(&self) -> &str {
        "Headless"
    }

    fn open(&mut self, desc: &PlatformDescriptor) -> Result<()> {
        let mut shared = self.shared.borrow_mut();

        if shared.fail_connect {
            return Err(PlatformError::ResourceUnavailable(
                "simulated display connection failure".to_string(),
            ));
        }
        shared.open_connections += 1;

        if shared.fail_window {
            // 窗口创建失败时释放刚打开的连接
            shared.open_connections -= 1;
            return Err(PlatformError::CreationFailure(
                "simulated window creation failure".to_string(),
            ));
        }

        let id = self.next_window_id;
        self.next_window_id += 1;
        shared.window = Some(SimulatedWindow {
            id,
            title: desc.title.clone(),
            width: desc.width,
            height: desc.height,
            resizable: desc.resizable,
            fullscreen: desc.fullscreen,
        });
        shared.native_calls = 0;

        platform_debug!(window = id, "Headless window opened");
        Ok(())
    }

    fn close(&mut self) {
        let mut shared = self.shared.borrow_mut();
        if let Some(window) = shared.window.take() {
            platform_debug!(window = window.id, "Headless window closed");
        }
        shared.open_connections = 0;
        shared.queue.clear();
    }

    fn is_open(&self) -> bool {
        self.shared.borrow().window.is_some()
    }

    fn pump_events(&mut self, out: &mut Vec<NativeEvent>) -> Result<()> {
        let mut shared = self.shared.borrow_mut();
        shared.native_calls += 1;
        out.extend(shared.queue.drain(..));

        if shared.fail_pump {
            return Err(PlatformError::Native("simulated event pump failure".to_string()));
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        self.with_window(|w| w.title = title.to_string())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<Option<(u32, u32)>> {
        let (width, height) = match self.shared.borrow().size_limit {
            Some((max_w, max_h)) => (width.min(max_w), height.min(max_h)),
            None => (width, height),
        };
        self.with_window(|w| {
            w.width = width;
            w.height = height;
            Some((width, height))
        })
    }

    fn raw_handles(&self) -> Option<(RawDisplayHandle, RawWindowHandle)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::event::KeyCode;

    #[test]
    fn test_open_close() {
        let (mut backend, control) = HeadlessBackend::with_control();
        backend.open(&PlatformDescriptor::new("T", 320, 240)).unwrap();

        assert!(backend.is_open());
        assert_eq!(control.open_connections(), 1);
        assert_eq!(control.window_title().as_deref(), Some("T"));
        assert_eq!(control.window_size(), Some((320, 240)));
        assert_eq!(control.window_resizable(), Some(true));

        backend.close();
        backend.close();
        assert!(!backend.is_open());
        assert_eq!(control.open_connections(), 0);
    }

    #[test]
    fn test_window_failure_releases_connection() {
        let (mut backend, control) = HeadlessBackend::with_control();
        control.fail_window(true);

        let err = backend.open(&PlatformDescriptor::default()).unwrap_err();
        assert!(matches!(err, PlatformError::CreationFailure(_)));
        assert_eq!(control.open_connections(), 0);
        assert!(!control.has_window());
    }

    #[test]
    fn test_connect_failure() {
        let (mut backend, control) = HeadlessBackend::with_control();
        control.fail_connect(true);

        let err = backend.open(&PlatformDescriptor::default()).unwrap_err();
        assert!(matches!(err, PlatformError::ResourceUnavailable(_)));
        assert_eq!(control.open_connections(), 0);
    }

    #[test]
    fn test_pump_preserves_order() {
        let (mut backend, control) = HeadlessBackend::with_control();
        backend.open(&PlatformDescriptor::default()).unwrap();
        control.push_events([
            NativeEvent::Exposed,
            NativeEvent::KeyPressed(KeyCode::Escape),
        ]);

        let mut events = Vec::new();
        backend.pump_events(&mut events).unwrap();
        assert_eq!(
            events,
            vec![NativeEvent::Exposed, NativeEvent::KeyPressed(KeyCode::Escape)]
        );
        assert_eq!(control.pending_events(), 0);
    }

    #[test]
    fn test_resize_reports_applied_size() {
        let (mut backend, control) = HeadlessBackend::with_control();
        backend.open(&PlatformDescriptor::default()).unwrap();

        assert_eq!(backend.resize(640, 480).unwrap(), Some((640, 480)));

        control.limit_size(Some((1024, 768)));
        assert_eq!(backend.resize(1920, 600).unwrap(), Some((1024, 600)));
        assert_eq!(control.window_size(), Some((1024, 600)));
    }

    #[test]
    fn test_failed_pump_keeps_drained_events() {
        let (mut backend, control) = HeadlessBackend::with_control();
        backend.open(&PlatformDescriptor::default()).unwrap();
        control.push_event(NativeEvent::CloseRequested);
        control.fail_pump(true);

        let mut events = Vec::new();
        assert!(backend.pump_events(&mut events).is_err());
        assert_eq!(events, vec![NativeEvent::CloseRequested]);
        assert_eq!(control.pending_events(), 0);
    }
}
