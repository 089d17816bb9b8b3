//! 旋转的三色三角形

use crate::core::error::DemoResult;
use crate::core::{Demo, FrameTime};
use crate::platform::{InputEvent, Window};
use crate::render::{DrawState, GraphicsContext, Primitive, Vertex};
use glam::{Mat4, Vec3};

pub const TITLE: &str = "Simple example";

/// 每秒旋转角度
pub const DEGREES_PER_SECOND: f64 = 50.0;

pub fn triangle() -> [Vertex; 3] {
    [
        Vertex::colored(Vec3::new(-0.6, -0.4, 0.0), Vec3::X),
        Vertex::colored(Vec3::new(0.6, -0.4, 0.0), Vec3::Y),
        Vertex::colored(Vec3::new(0.0, 0.6, 0.0), Vec3::Z),
    ]
}

/// 保持宽高比的正交投影乘以旋转
pub fn simple_transform(aspect_ratio: f32, elapsed_seconds: f64) -> Mat4 {
    let angle = (elapsed_seconds * DEGREES_PER_SECOND).to_radians() as f32;
    Mat4::orthographic_rh(-aspect_ratio, aspect_ratio, -1.0, 1.0, -1.0, 1.0)
        * Mat4::from_rotation_z(angle)
}

#[derive(Default)]
pub struct SimpleDemo;

impl SimpleDemo {
    pub fn new() -> Self {
        Self
    }
}

impl Demo for SimpleDemo {
    fn title(&self) -> &str {
        TITLE
    }

    fn init(&mut self, _ctx: &mut dyn GraphicsContext) -> DemoResult<()> {
        Ok(())
    }

    fn handle_input(&mut self, _event: &InputEvent, _window: &dyn Window) {}

    fn frame(&mut self, ctx: &mut dyn GraphicsContext, time: FrameTime) -> DemoResult<()> {
        ctx.begin_frame([0.0, 0.0, 0.0, 1.0])?;
        ctx.bind_texture(None)?;
        ctx.set_state(DrawState::FLAT);
        ctx.set_transform(simple_transform(ctx.aspect_ratio(), time.elapsed_seconds));
        ctx.submit(Primitive::Triangles, &triangle());
        ctx.end_frame()?;
        Ok(())
    }
}
