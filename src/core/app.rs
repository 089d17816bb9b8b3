//! 演示程序运行框架
//!
//! 每个演示实现 [`Demo`]；[`run_demo`] 创建窗口和 wgpu 上下文，驱动 winit 事件循环：
//!
//! - Escape 或关闭窗口结束循环
//! - 尺寸变化时重新配置上下文
//! - 每次重绘调用一次 [`Demo::frame`]
//! - 循环结束后调用 [`Demo::shutdown`]，演示在这里回收自己的线程

use super::error::{DemoError, DemoResult, PlatformError};
use super::time::{FrameTime, Timer};
use crate::config::WindowConfig;
use crate::platform::{translate_window_event, InputEvent, KeyCode, Window, WinitWindow};
use crate::render::wgpu::WgpuContext;
use crate::render::GraphicsContext;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};

/// 一个演示程序
pub trait Demo {
    fn title(&self) -> &str;

    /// 创建纹理等一次性资源
    fn init(&mut self, ctx: &mut dyn GraphicsContext) -> DemoResult<()>;

    fn handle_input(&mut self, event: &InputEvent, window: &dyn Window);

    /// 渲染一帧
    fn frame(&mut self, ctx: &mut dyn GraphicsContext, time: FrameTime) -> DemoResult<()>;

    fn shutdown(&mut self) {}
}

/// 按键是否结束程序
pub fn is_exit_request(event: &InputEvent) -> bool {
    matches!(
        event,
        InputEvent::KeyPressed {
            key: KeyCode::Escape
        } | InputEvent::WindowCloseRequested
    )
}

/// 在窗口中运行演示直到退出
pub fn run_demo<D: Demo>(mut demo: D, window_config: &WindowConfig) -> DemoResult<()> {
    let event_loop =
        EventLoop::new().map_err(|e| PlatformError::EventLoop(e.to_string()))?;
    let window = WinitWindow::try_new(&event_loop, window_config, demo.title())?;
    let mut ctx = WgpuContext::new(window.handle(), window_config.vsync)?;
    let (width, height) = window.size();
    ctx.resize(width, height);

    demo.init(&mut ctx)?;
    tracing::info!(target: "app", "Running {} ({}x{})", demo.title(), width, height);

    let mut timer = Timer::new();
    let mut failure: Option<DemoError> = None;
    event_loop.set_control_flow(ControlFlow::Poll);

    let result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::RedrawRequested => {
                let time = timer.tick();
                if let Err(e) = demo.frame(&mut ctx, time) {
                    tracing::error!(target: "app", "Frame failed: {}", e);
                    failure = Some(e);
                    elwt.exit();
                }
            }
            other => {
                let Some(input) = translate_window_event(&other) else {
                    return;
                };
                if is_exit_request(&input) {
                    elwt.exit();
                    return;
                }
                if let InputEvent::WindowResized { width, height } = input {
                    ctx.resize(width, height);
                }
                demo.handle_input(&input, &window);
            }
        },
        Event::AboutToWait => window.request_redraw(),
        _ => {}
    });

    demo.shutdown();
    tracing::info!(target: "app", "{} finished", demo.title());

    result.map_err(|e| DemoError::EventLoop(e.to_string()))?;
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
