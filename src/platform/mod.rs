//! 平台抽象层
//!
//! 打开原生窗口、驱动操作系统事件队列、跟踪窗口生命周期，
//! 并向图形层提供与后端无关的表面句柄。
//!
//! # 模块组织
//!
//! - `facade`：平台门面 [`Platform`]，宿主程序唯一需要的接口
//! - `backend`：原生后端 trait、后端类别与工厂
//! - `state`：生命周期状态机与事件归约
//! - `event`：与后端无关的原生事件
//! - `descriptor`：窗口创建参数
//! - `surface`：交给图形层的表面句柄
//! - `x11`：基于 x11rb 的 X11 后端
//! - `winit_backend`：基于 winit 的 X11/Wayland 后端
//! - `headless`：不连接显示服务器的后端，用于测试

pub mod backend;
pub mod descriptor;
pub mod event;
pub mod facade;
pub mod headless;
pub mod state;
pub mod surface;
pub mod winit_backend;
#[cfg(all(unix, not(target_os = "macos")))]
pub mod x11;

pub use backend::{create_backend, BackendKind, BackendTag, NativeBackend};
pub use descriptor::PlatformDescriptor;
pub use event::{KeyCode, NativeEvent};
pub use facade::Platform;
pub use headless::{HeadlessBackend, HeadlessControl};
pub use state::{Lifecycle, WindowState};
pub use surface::SurfaceHandle;
pub use winit_backend::WinitBackend;
#[cfg(all(unix, not(target_os = "macos")))]
pub use x11::X11Backend;
