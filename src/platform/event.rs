//! 原生事件模型
//!
//! 各后端把窗口系统的原生事件翻译成与后端无关的 [`NativeEvent`]，
//! 再由平台门面按到达顺序归约到窗口状态上。
//!
//! # 归约规则
//!
//! | 事件 | 效果 |
//! |------|------|
//! | `CloseRequested` | 停止运行 |
//! | `KeyPressed(KeyCode::Escape)` | 停止运行 |
//! | `Resized` | 更新描述符中的宽高 |
//! | 其他 | 忽略 |

use std::fmt;

/// 按键（简化版本）
///
/// 平台层只关心"取消"键，其余按键统一为 `Unidentified`，
/// 完整的键盘处理属于输入子系统。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Escape 键，平台的取消键
    Escape,

    /// 其他按键
    Unidentified,
}

/// 与后端无关的窗口事件
///
/// # 示例
///
/// ```
/// use gunmetal::platform::{KeyCode, NativeEvent};
///
/// let event = NativeEvent::KeyPressed(KeyCode::Escape);
/// assert!(event.requests_quit());
/// assert_eq!(event.name(), "KeyPressed");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeEvent {
    /// 窗口系统通过关闭协议请求关闭窗口
    ///
    /// 后端负责先核对关闭协议令牌，只有匹配时才产生该事件
    CloseRequested,

    /// 按键按下
    KeyPressed(KeyCode),

    /// 按键释放
    KeyReleased(KeyCode),

    /// 窗口几何变化，携带窗口系统报告的新尺寸
    Resized { width: u32, height: u32 },

    /// 窗口内容需要重绘
    Exposed,

    /// 指针按钮或移动
    Pointer,

    /// 其他事件
    Other,
}

impl NativeEvent {
    /// 事件名称，用于日志记录
    pub fn name(&self) -> &'static str {
        match self {
            NativeEvent::CloseRequested => "CloseRequested",
            NativeEvent::KeyPressed(_) => "KeyPressed",
            NativeEvent::KeyReleased(_) => "KeyReleased",
            NativeEvent::Resized { .. } => "Resized",
            NativeEvent::Exposed => "Exposed",
            NativeEvent::Pointer => "Pointer",
            NativeEvent::Other => "Other",
        }
    }

    /// 该事件是否要求停止运行
    pub fn requests_quit(&self) -> bool {
        matches!(
            self,
            NativeEvent::CloseRequested | NativeEvent::KeyPressed(KeyCode::Escape)
        )
    }
}

impl fmt::Display for NativeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeEvent::Resized { width, height } => write!(f, "Resized: {}x{}", width, height),
            NativeEvent::KeyPressed(key) => write!(f, "KeyPressed: {:?}", key),
            NativeEvent::KeyReleased(key) => write!(f, "KeyReleased: {:?}", key),
            other => f.write_str(other.name()),
        }
    }
}
