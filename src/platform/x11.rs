//! X11 原生后端
//!
//! 基于 `x11rb` 的 XCB 连接直接与 X 服务器通信，不依赖任何图形 API。
//! 使用 libxcb 连接（运行时加载）而不是纯 Rust 连接，
//! 这样表面句柄可以把真实的 `xcb_connection_t` 交给图形层。
//!
//! # 窗口创建流程
//!
//! 1. 连接默认显示，取默认屏幕的根窗口
//! 2. 在 (0, 0) 创建顶层窗口，黑色背景，选择需要的事件类别
//! 3. 设置标题，注册 `WM_DELETE_WINDOW` 关闭协议
//! 4. 不可调整大小时把最小/最大尺寸固定为初始尺寸
//! 5. 全屏时设置 `_NET_WM_STATE_FULLSCREEN`
//! 6. 映射窗口并刷新

use std::num::NonZeroU32;
use std::ptr::NonNull;

use raw_window_handle::{RawDisplayHandle, RawWindowHandle, XcbDisplayHandle, XcbWindowHandle};
use x11rb::connection::Connection;
use x11rb::errors::ReplyOrIdError;
use x11rb::properties::WmSizeHints;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ConfigureWindowAux, ConnectionExt as _, CreateWindowAux, EventMask, Keycode,
    Keysym, PropMode, Window, WindowClass,
};
use x11rb::protocol::Event;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::xcb_ffi::XCBConnection;
use x11rb::COPY_DEPTH_FROM_PARENT;

use super::backend::{BackendTag, NativeBackend};
use super::descriptor::PlatformDescriptor;
use super::event::{KeyCode, NativeEvent};
use crate::core::error::{PlatformError, Result};
use crate::{platform_debug, platform_info, platform_warn};

/// `XK_Escape`
const XK_ESCAPE: Keysym = 0xff1b;

x11rb::atom_manager! {
    Atoms: AtomsCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        UTF8_STRING,
        _NET_WM_NAME,
        _NET_WM_STATE,
        _NET_WM_STATE_FULLSCREEN,
    }
}

/// 一次成功 `open` 后持有的全部原生资源
struct X11Session {
    conn: XCBConnection,
    screen: usize,
    window: Window,
    atoms: Atoms,
    escape_keycodes: Vec<Keycode>,
    resizable: bool,
}

impl X11Session {
    /// 在已打开的连接上创建窗口
    ///
    /// 连接按值传入：出错时随 `Err` 一起被丢弃，连接随之关闭。
    fn create(
        conn: XCBConnection,
        screen: usize,
        desc: &PlatformDescriptor,
    ) -> std::result::Result<Self, ReplyOrIdError> {
        let (root, black_pixel, root_visual) = {
            let s = &conn.setup().roots[screen];
            (s.root, s.black_pixel, s.root_visual)
        };

        let atoms = Atoms::new(&conn)?.reply()?;
        let window = conn.generate_id()?;

        let event_mask = EventMask::EXPOSURE
            | EventMask::KEY_PRESS
            | EventMask::KEY_RELEASE
            | EventMask::BUTTON_PRESS
            | EventMask::BUTTON_RELEASE
            | EventMask::POINTER_MOTION
            | EventMask::STRUCTURE_NOTIFY;

        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            root,
            0,
            0,
            clamp_dimension(desc.width),
            clamp_dimension(desc.height),
            0,
            WindowClass::INPUT_OUTPUT,
            root_visual,
            &CreateWindowAux::new()
                .background_pixel(black_pixel)
                .border_pixel(black_pixel)
                .event_mask(event_mask),
        )?
        .check()?;

        let session = Self {
            escape_keycodes: query_escape_keycodes(&conn)?,
            conn,
            screen,
            window,
            atoms,
            resizable: desc.resizable,
        };

        session.store_title(&desc.title)?;

        // 注册关闭协议：窗口管理器发送 ClientMessage 而不是直接销毁窗口
        session.conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.WM_PROTOCOLS,
            AtomEnum::ATOM,
            &[atoms.WM_DELETE_WINDOW],
        )?;

        if let Some(size) = pinned_size(desc.resizable, desc.width, desc.height) {
            session.pin_size(size)?;
        }

        let state = wm_state(desc.fullscreen, atoms._NET_WM_STATE_FULLSCREEN);
        if !state.is_empty() {
            session.conn.change_property32(
                PropMode::REPLACE,
                window,
                atoms._NET_WM_STATE,
                AtomEnum::ATOM,
                &state,
            )?;
        }

        session.conn.map_window(window)?;
        session.conn.flush()?;

        Ok(session)
    }

    fn store_title(&self, title: &str) -> std::result::Result<(), ReplyOrIdError> {
        self.conn.change_property8(
            PropMode::REPLACE,
            self.window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title.as_bytes(),
        )?;
        self.conn.change_property8(
            PropMode::REPLACE,
            self.window,
            self.atoms._NET_WM_NAME,
            self.atoms.UTF8_STRING,
            title.as_bytes(),
        )?;
        Ok(())
    }

    /// 把最小/最大尺寸提示固定为给定尺寸，窗口管理器因此无法调整大小
    fn pin_size(&self, size: (i32, i32)) -> std::result::Result<(), ReplyOrIdError> {
        let mut hints = WmSizeHints::new();
        hints.min_size = Some(size);
        hints.max_size = Some(size);
        hints.set_normal_hints(&self.conn, self.window)?;
        Ok(())
    }
}

/// 查询服务器键盘映射中无修饰键时产生 `XK_Escape` 的键码
fn query_escape_keycodes(conn: &XCBConnection) -> std::result::Result<Vec<Keycode>, ReplyOrIdError> {
    let (min_keycode, max_keycode) = {
        let setup = conn.setup();
        (setup.min_keycode, setup.max_keycode)
    };
    let count = max_keycode.saturating_sub(min_keycode).saturating_add(1);

    let mapping = conn.get_keyboard_mapping(min_keycode, count)?.reply()?;
    Ok(escape_keycodes(
        min_keycode,
        mapping.keysyms_per_keycode,
        &mapping.keysyms,
    ))
}

/// 从键盘映射表中找出第 0 列为 `XK_Escape` 的键码
pub(crate) fn escape_keycodes(
    min_keycode: Keycode,
    keysyms_per_keycode: u8,
    keysyms: &[Keysym],
) -> Vec<Keycode> {
    if keysyms_per_keycode == 0 {
        return Vec::new();
    }

    keysyms
        .chunks(usize::from(keysyms_per_keycode))
        .enumerate()
        .filter(|(_, syms)| syms.first() == Some(&XK_ESCAPE))
        .filter_map(|(offset, _)| Keycode::try_from(usize::from(min_keycode) + offset).ok())
        .collect()
}

fn translate_key(keycode: Keycode, escape_keycodes: &[Keycode]) -> KeyCode {
    if escape_keycodes.contains(&keycode) {
        KeyCode::Escape
    } else {
        KeyCode::Unidentified
    }
}

/// 把一个 X11 事件翻译为 [`NativeEvent`]
///
/// 只有第一个数据字等于关闭协议令牌的 ClientMessage 才算关闭请求。
/// 每个 ConfigureNotify 都按尺寸变化处理（移动窗口时尺寸不变，归约结果相同）。
pub(crate) fn translate(event: &Event, close_token: Atom, escape_keycodes: &[Keycode]) -> NativeEvent {
    match event {
        Event::ClientMessage(ev) if ev.format == 32 && ev.data.as_data32()[0] == close_token => {
            NativeEvent::CloseRequested
        }
        Event::KeyPress(ev) => NativeEvent::KeyPressed(translate_key(ev.detail, escape_keycodes)),
        Event::KeyRelease(ev) => NativeEvent::KeyReleased(translate_key(ev.detail, escape_keycodes)),
        Event::ConfigureNotify(ev) => NativeEvent::Resized {
            width: u32::from(ev.width),
            height: u32::from(ev.height),
        },
        Event::Expose(_) => NativeEvent::Exposed,
        Event::ButtonPress(_) | Event::ButtonRelease(_) | Event::MotionNotify(_) => {
            NativeEvent::Pointer
        }
        _ => NativeEvent::Other,
    }
}

/// 不可调整大小的窗口需要固定的尺寸提示 (min = max)；可调整大小时不设置
pub(crate) fn pinned_size(resizable: bool, width: u32, height: u32) -> Option<(i32, i32)> {
    if resizable {
        return None;
    }
    Some((
        i32::from(clamp_dimension(width)),
        i32::from(clamp_dimension(height)),
    ))
}

/// 创建窗口时写入 `_NET_WM_STATE` 的原子列表
pub(crate) fn wm_state(fullscreen: bool, fullscreen_atom: Atom) -> Vec<Atom> {
    if fullscreen {
        vec![fullscreen_atom]
    } else {
        Vec::new()
    }
}

fn clamp_dimension(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn native_error(err: impl std::fmt::Display) -> PlatformError {
    PlatformError::Native(err.to_string())
}

/// X11 后端
pub struct X11Backend {
    session: Option<X11Session>,
}

impl X11Backend {
    /// 创建后端，此时还没有连接 X 服务器
    pub fn new() -> Self {
        Self { session: None }
    }

    fn session(&self) -> Result<&X11Session> {
        self.session
            .as_ref()
            .ok_or_else(|| PlatformError::Native("X11 window is not open".to_string()))
    }
}

impl Default for X11Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBackend for X11Backend {
    fn tag(&self) -> BackendTag {
        BackendTag::X11
    }

    fn name(&self) -> &str {
        "X11"
    }

    fn open(&mut self, desc: &PlatformDescriptor) -> Result<()> {
        if self.session.is_some() {
            return Err(PlatformError::AlreadyInitialized);
        }

        let (conn, screen) = XCBConnection::connect(None).map_err(|e| {
            platform_warn!(error = %e, "Failed to open X11 display");
            PlatformError::ResourceUnavailable(e.to_string())
        })?;
        platform_debug!(screen, "X11 display connection opened");

        let session = X11Session::create(conn, screen, desc).map_err(|e| {
            platform_warn!(error = %e, "Failed to create X11 window");
            PlatformError::CreationFailure(e.to_string())
        })?;

        platform_info!(
            window = session.window,
            escape_keycodes = ?session.escape_keycodes,
            "X11 window created"
        );
        self.session = Some(session);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.conn.destroy_window(session.window) {
                platform_warn!(error = %e, "Failed to destroy X11 window");
            }
            if let Err(e) = session.conn.flush() {
                platform_warn!(error = %e, "Failed to flush X11 connection");
            }
            platform_debug!(window = session.window, "X11 window destroyed");
            // 连接随 session 一起关闭
        }
    }

    fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn pump_events(&mut self, out: &mut Vec<NativeEvent>) -> Result<()> {
        let session = self.session()?;

        while let Some(event) = session.conn.poll_for_event().map_err(native_error)? {
            if let Event::Error(err) = &event {
                platform_warn!(error = ?err, "X11 protocol error");
            }
            out.push(translate(
                &event,
                session.atoms.WM_DELETE_WINDOW,
                &session.escape_keycodes,
            ));
        }

        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        let session = self.session()?;
        session.store_title(title).map_err(native_error)?;
        session.conn.flush().map_err(native_error)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<Option<(u32, u32)>> {
        let session = self.session()?;

        // 固定尺寸的窗口需要同时更新尺寸提示，否则窗口管理器会拒绝
        if let Some(size) = pinned_size(session.resizable, width, height) {
            session.pin_size(size).map_err(native_error)?;
        }

        session
            .conn
            .configure_window(
                session.window,
                &ConfigureWindowAux::new().width(width).height(height),
            )
            .map_err(native_error)?;
        session.conn.flush().map_err(native_error)?;

        // 实际尺寸由窗口管理器决定，稍后通过 ConfigureNotify 报告
        Ok(None)
    }

    fn raw_handles(&self) -> Option<(RawDisplayHandle, RawWindowHandle)> {
        let session = self.session.as_ref()?;

        let connection = NonNull::new(session.conn.get_raw_xcb_connection());
        let screen = i32::try_from(session.screen).ok()?;
        let display = XcbDisplayHandle::new(connection, screen);
        let window = XcbWindowHandle::new(NonZeroU32::new(session.window)?);

        Some((display.into(), window.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x11rb::protocol::xproto::{ClientMessageEvent, ConfigureNotifyEvent, CONFIGURE_NOTIFY_EVENT};

    const TOKEN: Atom = 321;

    #[test]
    fn test_escape_keycodes_from_mapping() {
        // 键码 8..=11，每个键码 2 列
        let keysyms = [0x61, 0x41, XK_ESCAPE, 0, 0x62, 0x42, 0, XK_ESCAPE];
        assert_eq!(escape_keycodes(8, 2, &keysyms), vec![9]);
        assert!(escape_keycodes(8, 0, &keysyms).is_empty());
    }

    #[test]
    fn test_translate_close_message() {
        let matching = ClientMessageEvent::new(32, 1, 7u32, [TOKEN, 0, 0, 0, 0]);
        let other = ClientMessageEvent::new(32, 1, 7u32, [TOKEN + 1, 0, 0, 0, 0]);

        assert_eq!(
            translate(&Event::ClientMessage(matching), TOKEN, &[]),
            NativeEvent::CloseRequested
        );
        assert_eq!(translate(&Event::ClientMessage(other), TOKEN, &[]), NativeEvent::Other);
    }

    #[test]
    fn test_translate_configure_notify() {
        let event = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: 1,
            window: 1,
            above_sibling: 0,
            x: 10,
            y: 20,
            width: 1280,
            height: 720,
            border_width: 0,
            override_redirect: false,
        };

        assert_eq!(
            translate(&Event::ConfigureNotify(event), TOKEN, &[]),
            NativeEvent::Resized { width: 1280, height: 720 }
        );
    }

    #[test]
    fn test_translate_key() {
        assert_eq!(translate_key(9, &[9]), KeyCode::Escape);
        assert_eq!(translate_key(10, &[9]), KeyCode::Unidentified);
    }

    #[test]
    fn test_size_hints_only_for_fixed_windows() {
        assert_eq!(pinned_size(true, 800, 600), None);
        assert_eq!(pinned_size(false, 800, 600), Some((800, 600)));
        assert_eq!(pinned_size(false, 100_000, 600), Some((65535, 600)));
    }

    #[test]
    fn test_fullscreen_state() {
        const FULLSCREEN: Atom = 77;
        assert_eq!(wm_state(true, FULLSCREEN), vec![FULLSCREEN]);
        assert!(wm_state(false, FULLSCREEN).is_empty());
    }

    #[test]
    fn test_closed_backend() {
        let mut backend = X11Backend::new();
        assert_eq!(backend.tag(), BackendTag::X11);
        assert!(!backend.is_open());
        assert!(backend.raw_handles().is_none());
        assert!(backend.pump_events(&mut Vec::new()).is_err());
        backend.close();
    }
}
