pub mod winit;

pub use self::winit::{translate_window_event, WinitWindow};

use crate::core::error::PlatformResult;

// ============================================================================
// Platform Window Abstraction
// ============================================================================

/// 演示程序能对窗口做的操作
pub trait Window {
    fn size(&self) -> (u32, u32);
    fn request_redraw(&self);
    fn set_title(&self, title: &str);
    fn set_fullscreen(&self, fullscreen: bool);

    /// 抓取并隐藏光标（拖拽旋转用），`false` 释放
    fn set_cursor_grab(&self, grab: bool) -> PlatformResult<()>;
}

// ============================================================================
// Input Abstraction
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard
    KeyPressed { key: KeyCode },
    KeyReleased { key: KeyCode },
    /// 修饰键状态变化
    ModifiersChanged { shift: bool },

    // Mouse
    MouseMoved { x: f32, y: f32 },
    MouseButtonPressed { button: MouseButton },
    MouseButtonReleased { button: MouseButton },
    /// 以行为单位
    MouseWheel { delta_x: f32, delta_y: f32 },

    // Window
    WindowResized { width: u32, height: u32 },
    WindowFocused(bool),
    WindowCloseRequested,
}

/// 演示程序用到的按键，按物理位置识别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    W,
    Z,
    Escape,
    Space,
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// 记录调用的窗口替身
    #[derive(Debug, Default)]
    pub struct MockWindow {
        pub size: (u32, u32),
        pub grabbed: Mutex<bool>,
        pub title: Mutex<String>,
        pub redraws: Mutex<u32>,
    }

    impl MockWindow {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                size: (width, height),
                ..Default::default()
            }
        }

        pub fn is_grabbed(&self) -> bool {
            *self.grabbed.lock().unwrap()
        }
    }

    impl Window for MockWindow {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn request_redraw(&self) {
            *self.redraws.lock().unwrap() += 1;
        }

        fn set_title(&self, title: &str) {
            *self.title.lock().unwrap() = title.to_string();
        }

        fn set_fullscreen(&self, _fullscreen: bool) {}

        fn set_cursor_grab(&self, grab: bool) -> PlatformResult<()> {
            *self.grabbed.lock().unwrap() = grab;
            Ok(())
        }
    }
}
