use super::{InputEvent, KeyCode, MouseButton};
use crate::config::WindowConfig;
use crate::core::error::{PlatformError, PlatformResult};
use std::sync::Arc;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::EventLoopWindowTarget;
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Fullscreen, Window as WinitWindowRaw, WindowBuilder, WindowId};

/// 像素滚动量折算为行的比例
const PIXELS_PER_LINE: f32 = 20.0;

#[derive(Clone)]
pub struct WinitWindow {
    window: Arc<WinitWindowRaw>,
}

impl WinitWindow {
    pub fn try_new(
        event_loop: &EventLoopWindowTarget<()>,
        config: &WindowConfig,
        title: &str,
    ) -> PlatformResult<Self> {
        let mut builder = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(LogicalSize::new(config.width, config.height));
        if config.fullscreen {
            builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = builder
            .build(event_loop)
            .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;
        Ok(Self {
            window: Arc::new(window),
        })
    }

    pub fn raw(&self) -> &WinitWindowRaw {
        &self.window
    }

    /// 共享句柄，供 wgpu 创建 `'static` 表面
    pub fn handle(&self) -> Arc<WinitWindowRaw> {
        Arc::clone(&self.window)
    }

    pub fn id(&self) -> WindowId {
        self.window.id()
    }
}

impl crate::platform::Window for WinitWindow {
    fn size(&self) -> (u32, u32) {
        let s = self.window.inner_size();
        (s.width, s.height)
    }

    fn request_redraw(&self) {
        self.window.request_redraw();
    }

    fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        if fullscreen {
            self.window
                .set_fullscreen(Some(Fullscreen::Borderless(None)));
        } else {
            self.window.set_fullscreen(None);
        }
    }

    fn set_cursor_grab(&self, grab: bool) -> PlatformResult<()> {
        if grab {
            // 部分平台只支持其中一种
            self.window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Locked))
                .map_err(|e| PlatformError::CursorGrab(e.to_string()))?;
        } else {
            self.window
                .set_cursor_grab(CursorGrabMode::None)
                .map_err(|e| PlatformError::CursorGrab(e.to_string()))?;
        }
        self.window.set_cursor_visible(!grab);
        Ok(())
    }
}

/// 把 winit 窗口事件翻译为 [`InputEvent`]
///
/// 按键重复被丢弃；关闭请求、重绘等由事件循环自己处理的事件返回 `None`。
pub fn translate_window_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            if event.repeat {
                return None;
            }
            let key = translate_key(event.physical_key);
            Some(match event.state {
                ElementState::Pressed => InputEvent::KeyPressed { key },
                ElementState::Released => InputEvent::KeyReleased { key },
            })
        }
        WindowEvent::ModifiersChanged(modifiers) => Some(InputEvent::ModifiersChanged {
            shift: modifiers.state().shift_key(),
        }),
        WindowEvent::MouseInput { state, button, .. } => {
            let button = translate_mouse_button(*button);
            Some(match state {
                ElementState::Pressed => InputEvent::MouseButtonPressed { button },
                ElementState::Released => InputEvent::MouseButtonReleased { button },
            })
        }
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::MouseMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::MouseWheel { delta, .. } => {
            let (delta_x, delta_y) = scroll_lines(*delta);
            Some(InputEvent::MouseWheel { delta_x, delta_y })
        }
        WindowEvent::Resized(size) => Some(InputEvent::WindowResized {
            width: size.width,
            height: size.height,
        }),
        WindowEvent::Focused(focused) => Some(InputEvent::WindowFocused(*focused)),
        WindowEvent::CloseRequested => Some(InputEvent::WindowCloseRequested),
        _ => None,
    }
}

fn translate_key(key: PhysicalKey) -> KeyCode {
    match key {
        PhysicalKey::Code(code) => match code {
            WinitKeyCode::KeyW => KeyCode::W,
            WinitKeyCode::KeyZ => KeyCode::Z,
            WinitKeyCode::Escape => KeyCode::Escape,
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::ArrowLeft => KeyCode::Left,
            WinitKeyCode::ArrowRight => KeyCode::Right,
            WinitKeyCode::ArrowUp => KeyCode::Up,
            WinitKeyCode::ArrowDown => KeyCode::Down,
            WinitKeyCode::PageUp => KeyCode::PageUp,
            WinitKeyCode::PageDown => KeyCode::PageDown,
            _ => KeyCode::Unknown,
        },
        PhysicalKey::Unidentified(_) => KeyCode::Unknown,
    }
}

fn translate_mouse_button(button: winit::event::MouseButton) -> MouseButton {
    match button {
        winit::event::MouseButton::Left => MouseButton::Left,
        winit::event::MouseButton::Right => MouseButton::Right,
        winit::event::MouseButton::Middle => MouseButton::Middle,
        winit::event::MouseButton::Other(b) => MouseButton::Other(b),
        winit::event::MouseButton::Back => MouseButton::Other(8),
        winit::event::MouseButton::Forward => MouseButton::Other(9),
    }
}

fn scroll_lines(delta: MouseScrollDelta) -> (f32, f32) {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => (x, y),
        MouseScrollDelta::PixelDelta(p) => (p.x as f32 / PIXELS_PER_LINE, p.y as f32 / PIXELS_PER_LINE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::{PhysicalPosition, PhysicalSize};

    #[test]
    fn test_translate_keys() {
        assert_eq!(translate_key(PhysicalKey::Code(WinitKeyCode::KeyW)), KeyCode::W);
        assert_eq!(
            translate_key(PhysicalKey::Code(WinitKeyCode::PageDown)),
            KeyCode::PageDown
        );
        assert_eq!(translate_key(PhysicalKey::Code(WinitKeyCode::KeyZ)), KeyCode::Z);
        assert_eq!(translate_key(PhysicalKey::Code(WinitKeyCode::KeyQ)), KeyCode::Unknown);
    }

    #[test]
    fn test_translate_mouse_buttons() {
        assert_eq!(
            translate_mouse_button(winit::event::MouseButton::Left),
            MouseButton::Left
        );
        assert_eq!(
            translate_mouse_button(winit::event::MouseButton::Other(5)),
            MouseButton::Other(5)
        );
    }

    #[test]
    fn test_scroll_in_lines() {
        assert_eq!(scroll_lines(MouseScrollDelta::LineDelta(0.0, -1.0)), (0.0, -1.0));
        assert_eq!(
            scroll_lines(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 40.0))),
            (0.0, 2.0)
        );
    }

    #[test]
    fn test_translate_window_events() {
        assert_eq!(
            translate_window_event(&WindowEvent::Resized(PhysicalSize::new(800, 600))),
            Some(InputEvent::WindowResized {
                width: 800,
                height: 600
            })
        );
        assert_eq!(
            translate_window_event(&WindowEvent::Focused(false)),
            Some(InputEvent::WindowFocused(false))
        );
        assert_eq!(
            translate_window_event(&WindowEvent::CloseRequested),
            Some(InputEvent::WindowCloseRequested)
        );
        assert_eq!(translate_window_event(&WindowEvent::RedrawRequested), None);
    }
}
