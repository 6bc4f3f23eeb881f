//! 平台门面
//!
//! [`Platform`] 是宿主程序和图形层唯一依赖的接口。它持有一个原生后端和
//! 窗口状态，负责生命周期状态机和事件归约；所有原生操作都委托给后端。
//!
//! # 使用示例
//!
//! ```no_run
//! use gunmetal::platform::{BackendKind, Platform, PlatformDescriptor};
//!
//! let mut platform = Platform::with_kind(BackendKind::Auto)?;
//! platform.init(&PlatformDescriptor::new("Simple Window", 800, 600))?;
//!
//! while platform.running() {
//!     platform.poll_events()?;
//!     // 在这里渲染
//! }
//!
//! platform.shutdown();
//! # Ok::<(), gunmetal::core::PlatformError>(())
//! ```

use super::backend::{create_backend, BackendKind, BackendTag, NativeBackend};
use super::descriptor::{validate_size, PlatformDescriptor};
use super::event::NativeEvent;
use super::headless::{HeadlessBackend, HeadlessControl};
use super::state::{Lifecycle, Reduction, WindowState};
use super::surface::SurfaceHandle;
use crate::core::config::PlatformConfig;
use crate::core::error::{PlatformError, Result};
use crate::{platform_debug, platform_error, platform_info, platform_warn};

/// 平台上下文
///
/// 由宿主程序持有并在单线程中使用。丢弃时会自动执行 [`Platform::shutdown`]。
pub struct Platform {
    backend: Box<dyn NativeBackend>,
    state: WindowState,
    events: Vec<NativeEvent>,
}

impl Platform {
    /// 使用给定的原生后端创建平台上下文
    pub fn new(backend: Box<dyn NativeBackend>) -> Self {
        Self {
            backend,
            state: WindowState::new(),
            events: Vec::new(),
        }
    }

    /// 通过后端工厂创建平台上下文
    pub fn with_kind(kind: BackendKind) -> Result<Self> {
        Ok(Self::new(create_backend(kind)?))
    }

    /// 根据 `[platform]` 配置创建平台上下文
    pub fn from_config(config: &PlatformConfig) -> Result<Self> {
        Self::with_kind(config.backend)
    }

    /// 创建使用无头后端的平台上下文，同时返回后端的控制句柄
    pub fn headless() -> (Self, HeadlessControl) {
        let (backend, control) = HeadlessBackend::with_control();
        (Self::new(Box::new(backend)), control)
    }

    /// 打开窗口并进入 `Running`
    ///
    /// # 错误
    ///
    /// - `InvalidArgument`：描述符尺寸无效，不触碰任何原生资源
    /// - `AlreadyInitialized`：上下文已经持有窗口，已有窗口保持不变
    /// - `ResourceUnavailable` / `CreationFailure`：由后端报告，失败时不持有任何资源
    pub fn init(&mut self, descriptor: &PlatformDescriptor) -> Result<()> {
        if self.state.lifecycle() != Lifecycle::Uninitialized {
            return Err(PlatformError::AlreadyInitialized);
        }

        descriptor.validate()?;

        if let Err(e) = self.backend.open(descriptor) {
            platform_error!(
                backend = self.backend.name(),
                error = %e,
                "Platform initialization failed"
            );
            return Err(e);
        }
        self.state.start(descriptor.clone());

        platform_info!(
            backend = self.backend.name(),
            title = %descriptor.title,
            width = descriptor.width,
            height = descriptor.height,
            resizable = descriptor.resizable,
            fullscreen = descriptor.fullscreen,
            "Platform initialized"
        );
        Ok(())
    }

    /// 释放窗口与连接，回到 `Uninitialized`
    ///
    /// 幂等：未初始化或重复调用时不做任何事。
    pub fn shutdown(&mut self) {
        let was_live = self.state.lifecycle().holds_window() || self.backend.is_open();

        self.backend.close();
        self.state.reset();
        self.events.clear();

        if was_live {
            platform_info!(backend = self.backend.name(), "Platform shut down");
        }
    }

    /// 非阻塞地取出并处理所有已排队的原生事件
    ///
    /// 事件按到达顺序归约。返回本次处理的事件数量。
    /// 在 `ShuttingDown` 状态下仍可调用，尺寸变化会继续被记录。
    ///
    /// 后端在出错前已经取出的事件照常归约，然后再返回错误。
    pub fn poll_events(&mut self) -> Result<usize> {
        self.require_window("poll events")?;

        self.events.clear();
        let pumped = self.backend.pump_events(&mut self.events);

        for event in &self.events {
            match self.state.apply(event) {
                Reduction::Quit => {
                    platform_info!(event = event.name(), "Quit requested by window system")
                }
                Reduction::Resized => platform_debug!(%event, "Window resized"),
                Reduction::Ignored => {}
            }
        }

        if let Err(e) = pumped {
            platform_warn!(
                error = %e,
                drained = self.events.len(),
                "Event pump failed"
            );
            return Err(e);
        }

        Ok(self.events.len())
    }

    /// 是否处于 `Running`
    pub fn running(&self) -> bool {
        self.state.running()
    }

    /// 停止运行，但不释放原生资源
    ///
    /// 窗口保持映射，直到调用 [`Platform::shutdown`]。
    pub fn request_quit(&mut self) -> Result<()> {
        self.require_window("request quit")?;

        if self.state.running() {
            platform_info!("Quit requested by application");
        }
        self.state.request_quit();
        Ok(())
    }

    /// 当前原生句柄与尺寸的快照
    pub fn surface(&self) -> Result<SurfaceHandle<'_>> {
        self.require_window("get surface")?;

        let size = self.descriptor_ref()?.size();
        Ok(SurfaceHandle::new(
            self.backend.raw_handles(),
            self.backend.tag(),
            size,
        ))
    }

    /// 后端类别，与生命周期状态无关
    pub fn backend_type(&self) -> BackendTag {
        self.backend.tag()
    }

    /// 后端名称
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// 设置窗口标题，仅在 `Running` 状态下有效
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.require_running("set title")?;

        self.backend.set_title(title)?;
        if let Some(desc) = self.state.descriptor_mut() {
            desc.title = title.to_string();
        }
        platform_debug!(title, "Window title changed");
        Ok(())
    }

    /// 当前窗口尺寸 `(width, height)`
    pub fn size(&self) -> Result<(u32, u32)> {
        self.require_window("get size")?;
        Ok(self.descriptor_ref()?.size())
    }

    /// 调整原生窗口尺寸并更新保存的描述符，仅在 `Running` 状态下有效
    ///
    /// 后端报告了实际应用的尺寸时保存实际尺寸，否则保存请求的尺寸。
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.require_running("set size")?;
        validate_size(width, height)?;

        let (width, height) = self.backend.resize(width, height)?.unwrap_or((width, height));
        if let Some(desc) = self.state.descriptor_mut() {
            desc.width = width;
            desc.height = height;
        }
        platform_debug!(width, height, "Window size set");
        Ok(())
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lifecycle()
    }

    /// 保存的描述符副本（包含最新的尺寸与标题）
    pub fn descriptor(&self) -> Option<&PlatformDescriptor> {
        self.state.descriptor()
    }

    fn descriptor_ref(&self) -> Result<&PlatformDescriptor> {
        self.state
            .descriptor()
            .ok_or_else(|| PlatformError::not_ready("read descriptor", self.lifecycle()))
    }

    fn require_window(&self, operation: &'static str) -> Result<()> {
        if self.state.lifecycle().holds_window() {
            Ok(())
        } else {
            Err(PlatformError::not_ready(operation, self.lifecycle()))
        }
    }

    fn require_running(&self, operation: &'static str) -> Result<()> {
        if self.state.running() {
            Ok(())
        } else {
            Err(PlatformError::not_ready(operation, self.lifecycle()))
        }
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::event::KeyCode;

    fn descriptor() -> PlatformDescriptor {
        PlatformDescriptor::new("T", 800, 600)
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (mut platform, control) = Platform::headless();
        platform.shutdown();
        platform.shutdown();
        assert!(!platform.running());

        platform.init(&descriptor()).unwrap();
        platform.shutdown();
        platform.shutdown();
        assert!(!platform.running());
        assert_eq!(platform.lifecycle(), Lifecycle::Uninitialized);
        assert_eq!(control.open_connections(), 0);
    }

    #[test]
    fn test_invalid_descriptor_has_no_side_effects() {
        let (mut platform, control) = Platform::headless();
        let err = platform.init(&PlatformDescriptor::new("T", 0, 600)).unwrap_err();

        assert!(matches!(err, PlatformError::InvalidArgument(_)));
        assert!(!platform.running());
        assert_eq!(control.open_connections(), 0);
        assert!(!control.has_window());
    }

    #[test]
    fn test_init_failures_leave_no_resources() {
        let (mut platform, control) = Platform::headless();

        control.fail_connect(true);
        assert!(matches!(
            platform.init(&descriptor()),
            Err(PlatformError::ResourceUnavailable(_))
        ));
        assert_eq!(platform.lifecycle(), Lifecycle::Uninitialized);

        control.fail_connect(false);
        control.fail_window(true);
        assert!(matches!(
            platform.init(&descriptor()),
            Err(PlatformError::CreationFailure(_))
        ));
        assert_eq!(control.open_connections(), 0);
        assert!(!platform.running());

        // 失败之后仍然可以正常初始化
        control.fail_window(false);
        platform.init(&descriptor()).unwrap();
        assert!(platform.running());
    }

    #[test]
    fn test_double_init_is_rejected() {
        let (mut platform, control) = Platform::headless();
        platform.init(&descriptor()).unwrap();

        let err = platform.init(&PlatformDescriptor::new("Other", 320, 240)).unwrap_err();
        assert!(matches!(err, PlatformError::AlreadyInitialized));
        assert_eq!(control.window_title().as_deref(), Some("T"));
        assert_eq!(platform.size().unwrap(), (800, 600));
        assert_eq!(control.open_connections(), 1);
    }

    #[test]
    fn test_size_round_trip() {
        let (mut platform, control) = Platform::headless();
        platform.init(&descriptor()).unwrap();
        assert_eq!(platform.size().unwrap(), (800, 600));

        platform.set_size(1024, 768).unwrap();
        assert_eq!(platform.size().unwrap(), (1024, 768));
        assert_eq!(control.window_size(), Some((1024, 768)));

        let surface = platform.surface().unwrap();
        assert_eq!((surface.width, surface.height), (1024, 768));
        assert_eq!(surface.backend, BackendTag::Headless);
    }

    #[test]
    fn test_set_size_rejects_zero() {
        let (mut platform, _control) = Platform::headless();
        platform.init(&descriptor()).unwrap();

        assert!(matches!(
            platform.set_size(0, 768),
            Err(PlatformError::InvalidArgument(_))
        ));
        assert_eq!(platform.size().unwrap(), (800, 600));
    }

    #[test]
    fn test_last_resize_in_poll_wins() {
        let (mut platform, control) = Platform::headless();
        platform.init(&descriptor()).unwrap();

        control.push_events([
            NativeEvent::Resized { width: 640, height: 480 },
            NativeEvent::Resized { width: 1280, height: 720 },
        ]);

        assert_eq!(platform.poll_events().unwrap(), 2);
        assert_eq!(platform.size().unwrap(), (1280, 720));
        assert!(platform.running());
    }

    #[test]
    fn test_close_request_stops_running() {
        let (mut platform, control) = Platform::headless();
        platform.init(&descriptor()).unwrap();

        control.push_event(NativeEvent::CloseRequested);
        platform.poll_events().unwrap();
        assert!(!platform.running());
        assert_eq!(platform.lifecycle(), Lifecycle::ShuttingDown);

        // 窗口仍然存在，直到 shutdown
        assert!(control.has_window());
        platform.shutdown();
        assert!(!control.has_window());
    }

    #[test]
    fn test_escape_stops_running() {
        let (mut platform, control) = Platform::headless();
        platform.init(&descriptor()).unwrap();

        control.push_events([
            NativeEvent::KeyPressed(KeyCode::Unidentified),
            NativeEvent::KeyReleased(KeyCode::Escape),
        ]);
        platform.poll_events().unwrap();
        assert!(platform.running());

        control.push_event(NativeEvent::KeyPressed(KeyCode::Escape));
        platform.poll_events().unwrap();
        assert!(!platform.running());
    }

    #[test]
    fn test_poll_without_events_returns_immediately() {
        let (mut platform, _control) = Platform::headless();
        platform.init(&descriptor()).unwrap();

        assert_eq!(platform.poll_events().unwrap(), 0);
        assert!(platform.running());
    }

    #[test]
    fn test_request_quit_is_immediate() {
        let (mut platform, control) = Platform::headless();
        platform.init(&descriptor()).unwrap();
        let calls = control.native_calls();

        platform.request_quit().unwrap();
        assert!(!platform.running());
        assert_eq!(control.native_calls(), calls);

        // 重复请求没有副作用
        platform.request_quit().unwrap();
        assert_eq!(platform.lifecycle(), Lifecycle::ShuttingDown);
    }

    #[test]
    fn test_operations_before_init_are_not_ready() {
        let (mut platform, control) = Platform::headless();

        assert!(platform.poll_events().unwrap_err().is_not_ready());
        assert!(platform.request_quit().unwrap_err().is_not_ready());
        assert!(platform.surface().unwrap_err().is_not_ready());
        assert!(platform.size().unwrap_err().is_not_ready());
        assert!(platform.set_title("T").unwrap_err().is_not_ready());
        assert!(platform.set_size(10, 10).unwrap_err().is_not_ready());
        assert_eq!(control.native_calls(), 0);
    }

    #[test]
    fn test_mutations_after_quit_are_not_ready() {
        let (mut platform, control) = Platform::headless();
        platform.init(&descriptor()).unwrap();
        platform.request_quit().unwrap();

        assert!(platform.set_title("Other").unwrap_err().is_not_ready());
        assert!(platform.set_size(10, 10).unwrap_err().is_not_ready());
        assert_eq!(control.window_title().as_deref(), Some("T"));

        // 查询与事件泵仍然可用
        assert_eq!(platform.size().unwrap(), (800, 600));
        control.push_event(NativeEvent::Resized { width: 400, height: 300 });
        platform.poll_events().unwrap();
        assert_eq!(platform.surface().unwrap().size(), (400, 300));
    }

    #[test]
    fn test_operations_after_shutdown_are_not_ready() {
        let (mut platform, control) = Platform::headless();
        platform.init(&descriptor()).unwrap();
        platform.shutdown();
        let calls = control.native_calls();

        assert!(platform.poll_events().unwrap_err().is_not_ready());
        assert!(platform.surface().unwrap_err().is_not_ready());
        assert!(platform.size().unwrap_err().is_not_ready());
        assert_eq!(control.native_calls(), calls);
        assert_eq!(control.open_connections(), 0);
    }

    #[test]
    fn test_pump_failure_still_applies_drained_events() {
        let (mut platform, control) = Platform::headless();
        platform.init(&descriptor()).unwrap();

        control.push_events([
            NativeEvent::Resized { width: 1280, height: 720 },
            NativeEvent::CloseRequested,
        ]);
        control.fail_pump(true);

        let err = platform.poll_events().unwrap_err();
        assert!(matches!(err, PlatformError::Native(_)));
        assert_eq!(platform.size().unwrap(), (1280, 720));
        assert!(!platform.running());
    }

    #[test]
    fn test_set_size_stores_applied_size() {
        let (mut platform, control) = Platform::headless();
        platform.init(&descriptor()).unwrap();
        control.limit_size(Some((1024, 768)));

        platform.set_size(1920, 1080).unwrap();
        assert_eq!(platform.size().unwrap(), (1024, 768));
        assert_eq!(platform.surface().unwrap().size(), (1024, 768));
        assert_eq!(control.window_size(), Some((1024, 768)));
    }

    #[test]
    fn test_set_title_updates_descriptor() {
        let (mut platform, control) = Platform::headless();
        platform.init(&descriptor()).unwrap();

        platform.set_title("Renamed").unwrap();
        assert_eq!(platform.descriptor().unwrap().title, "Renamed");
        assert_eq!(control.window_title().as_deref(), Some("Renamed"));
    }

    #[test]
    fn test_backend_tag_is_stable() {
        let (mut platform, _control) = Platform::headless();
        let tag = platform.backend_type();

        platform.init(&descriptor()).unwrap();
        assert_eq!(platform.backend_type(), tag);
        platform.request_quit().unwrap();
        assert_eq!(platform.backend_type(), tag);
        platform.shutdown();
        assert_eq!(platform.backend_type(), tag);
        assert_eq!(tag, BackendTag::Headless);
    }

    #[test]
    fn test_reinit_after_shutdown() {
        let (mut platform, control) = Platform::headless();
        platform.init(&descriptor()).unwrap();
        control.push_event(NativeEvent::Resized { width: 1, height: 1 });
        platform.shutdown();

        platform.init(&PlatformDescriptor::new("Second", 320, 240)).unwrap();
        assert_eq!(platform.size().unwrap(), (320, 240));
        // shutdown 会丢弃未处理的事件
        assert_eq!(platform.poll_events().unwrap(), 0);
    }

    #[test]
    fn test_fullscreen_flag_reaches_backend() {
        let (mut platform, control) = Platform::headless();
        platform
            .init(&descriptor().with_fullscreen(true))
            .unwrap();
        assert!(control.window_fullscreen());
    }

    #[test]
    fn test_drop_releases_window() {
        let (mut platform, control) = Platform::headless();
        platform.init(&descriptor()).unwrap();
        drop(platform);
        assert!(!control.has_window());
        assert_eq!(control.open_connections(), 0);
    }

    #[test]
    fn test_end_to_end() {
        let (mut platform, control) = Platform::headless();
        let desc = PlatformDescriptor::new("T", 320, 240)
            .with_resizable(false)
            .with_fullscreen(false);

        assert!(platform.init(&desc).is_ok());
        assert_eq!(control.window_resizable(), Some(false));
        assert!(!control.window_fullscreen());
        assert_eq!(platform.size().unwrap(), (320, 240));
        assert_eq!(platform.backend_type(), BackendTag::Headless);
        platform.request_quit().unwrap();
        assert!(!platform.running());
        platform.shutdown();
        platform.shutdown();
        assert!(!platform.running());
    }
}
