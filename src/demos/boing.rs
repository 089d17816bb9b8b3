//! Boing：经典 Amiga 弹球
//!
//! 绘制顺序为阴影球、紫色网格、球，不做深度测试。球面由 8 条纬带、每条 16 个
//! 面片组成，红白相间。

use crate::config::{BoingConfig, WindowConfig};
use crate::core::error::DemoResult;
use crate::core::{Demo, FrameTime};
use crate::physics::BoingBall;
use crate::platform::{InputEvent, MouseButton, Window};
use crate::render::{CullMode, DrawState, GraphicsContext, Primitive, Vertex};
use glam::{Mat4, Vec2, Vec3};

pub const TITLE: &str = "Boing (classic Amiga demo)";

pub const CLEAR_COLOR: [f32; 4] = [0.55, 0.55, 0.55, 0.0];

const STEP_LONGITUDE: f32 = 22.5;
const STEP_LATITUDE: f32 = 22.5;

const RED: Vec3 = Vec3::new(0.8, 0.1, 0.1);
const WHITE: Vec3 = Vec3::new(0.95, 0.95, 0.95);
const SHADOW: Vec3 = Vec3::new(0.35, 0.35, 0.35);
const PURPLE: Vec3 = Vec3::new(0.6, 0.1, 0.6);

const SHADOW_OFFSET: Vec3 = Vec3::new(-20.0, 10.0, 0.0);
const TILT_DEGREES: f32 = -20.0;

const GRID_ROWS: usize = 12;
const GRID_LINE_WIDTH: f32 = 2.0;
const GRID_Z: f32 = -40.0;

/// 球面面片（四边形），`shadow` 为真时全部涂成阴影灰
pub fn ball_facets(radius: f32, shadow: bool) -> Vec<Vertex> {
    let bands = (180.0 / STEP_LONGITUDE) as usize;
    let facets = (360.0 / STEP_LATITUDE) as usize;
    let mut vertices = Vec::with_capacity(bands * facets * 4);

    for band in 0..bands {
        let long_lo = band as f32 * STEP_LONGITUDE;
        let long_hi = long_lo + STEP_LONGITUDE;
        let (sin_lo, cos_lo) = long_lo.to_radians().sin_cos();
        let (sin_hi, cos_hi) = long_hi.to_radians().sin_cos();

        for facet in 0..facets {
            let lat = facet as f32 * STEP_LATITUDE;
            let (sin_a, cos_a) = lat.to_radians().sin_cos();
            let (sin_b, cos_b) = (lat + STEP_LATITUDE).to_radians().sin_cos();

            let color = if shadow {
                SHADOW
            } else if (band + facet) % 2 == 1 {
                RED
            } else {
                WHITE
            };

            let ne = Vec3::new(cos_a * radius * sin_hi, cos_hi * radius, sin_a * radius * sin_hi);
            let nw = Vec3::new(cos_b * radius * sin_hi, cos_hi * radius, sin_b * radius * sin_hi);
            let sw = Vec3::new(cos_b * radius * sin_lo, cos_lo * radius, sin_b * radius * sin_lo);
            let se = Vec3::new(cos_a * radius * sin_lo, cos_lo * radius, sin_a * radius * sin_lo);

            for corner in [ne, nw, sw, se] {
                vertices.push(Vertex::colored(corner, color));
            }
        }
    }
    vertices
}

/// 网格线（细长四边形），竖线在前
pub fn grid_lines(grid_size: f32) -> Vec<Vertex> {
    let cell = grid_size / GRID_ROWS as f32;
    let half = grid_size / 2.0;
    let mut vertices = Vec::with_capacity((GRID_ROWS + 1) * 2 * 4);

    let mut push_quad = |xl: f32, xr: f32, yt: f32, yb: f32| {
        for (x, y) in [(xr, yt), (xl, yt), (xl, yb), (xr, yb)] {
            vertices.push(Vertex::colored(Vec3::new(x, y, GRID_Z), PURPLE));
        }
    };

    for col in 0..=GRID_ROWS {
        let xl = -half + col as f32 * cell;
        push_quad(xl, xl + GRID_LINE_WIDTH, half, -half - GRID_LINE_WIDTH);
    }
    for row in 0..=GRID_ROWS {
        let yt = half - row as f32 * cell;
        push_quad(-half, half + GRID_LINE_WIDTH, yt, yt - GRID_LINE_WIDTH);
    }
    vertices
}

/// 透视投影：视野恰好容纳距离 200 处的球
pub fn boing_projection(config: &BoingConfig, aspect_ratio: f32) -> Mat4 {
    let fov = 2.0 * config.radius.atan2(200.0);
    Mat4::perspective_rh(fov, aspect_ratio, 1.0, config.view_distance())
}

/// 相机在 +Z 处看向原点，Y 轴朝下
pub fn boing_view(config: &BoingConfig) -> Mat4 {
    Mat4::look_at_rh(
        Vec3::new(0.0, 0.0, config.view_distance()),
        Vec3::ZERO,
        Vec3::NEG_Y,
    )
}

/// 球（或阴影）的模型矩阵
pub fn ball_model(config: &BoingConfig, position: Vec2, rotation: f32, shadow: bool) -> Mat4 {
    let mut offset = Vec3::new(position.x, position.y, config.ball_distance());
    if shadow {
        offset += SHADOW_OFFSET;
    }
    Mat4::from_translation(offset)
        * Mat4::from_rotation_z(TILT_DEGREES.to_radians())
        * Mat4::from_rotation_y(rotation.to_radians())
}

pub struct BoingDemo {
    ball: BoingBall,
    cursor: Vec2,
    ball_facets: Vec<Vertex>,
    shadow_facets: Vec<Vertex>,
    grid: Vec<Vertex>,
}

impl BoingDemo {
    pub fn new(config: &BoingConfig) -> Self {
        Self::with_ball(BoingBall::new(config))
    }

    pub fn with_ball(ball: BoingBall) -> Self {
        let config = ball.config();
        Self {
            ball_facets: ball_facets(config.radius, false),
            shadow_facets: ball_facets(config.radius, true),
            grid: grid_lines(config.grid_size()),
            ball,
            cursor: Vec2::ZERO,
        }
    }

    pub fn ball(&self) -> &BoingBall {
        &self.ball
    }

    /// 方形窗口，边长取配置高度
    pub fn window_config(base: &WindowConfig) -> WindowConfig {
        WindowConfig {
            width: base.height,
            ..base.clone()
        }
    }

    fn window_size(window: &dyn Window) -> Vec2 {
        let (width, height) = window.size();
        Vec2::new(width as f32, height as f32)
    }
}

impl Demo for BoingDemo {
    fn title(&self) -> &str {
        TITLE
    }

    fn init(&mut self, _ctx: &mut dyn GraphicsContext) -> DemoResult<()> {
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent, window: &dyn Window) {
        match *event {
            InputEvent::MouseMoved { x, y } => {
                self.cursor = Vec2::new(x, y);
                if self.ball.is_overridden() {
                    self.ball.follow_cursor(self.cursor, Self::window_size(window));
                }
            }
            InputEvent::MouseButtonPressed {
                button: MouseButton::Left,
            } => {
                self.ball.set_override(true);
                self.ball.follow_cursor(self.cursor, Self::window_size(window));
            }
            InputEvent::MouseButtonReleased {
                button: MouseButton::Left,
            } => self.ball.set_override(false),
            _ => {}
        }
    }

    fn frame(&mut self, ctx: &mut dyn GraphicsContext, time: FrameTime) -> DemoResult<()> {
        self.ball.advance(time.delta_seconds);

        let config = self.ball.config();
        let camera = boing_projection(config, ctx.aspect_ratio()) * boing_view(config);
        let position = self.ball.position();
        let rotation = self.ball.rotation();
        let ball_state = DrawState::FLAT.with_cull(CullMode::Front);

        ctx.begin_frame(CLEAR_COLOR)?;
        ctx.bind_texture(None)?;

        ctx.set_state(ball_state);
        ctx.set_transform(camera * ball_model(config, position, rotation, true));
        ctx.submit(Primitive::Quads, &self.shadow_facets);

        ctx.set_state(DrawState::FLAT);
        ctx.set_transform(camera * Mat4::from_translation(Vec3::Z * config.ball_distance()));
        ctx.submit(Primitive::Quads, &self.grid);

        ctx.set_state(ball_state);
        ctx.set_transform(camera * ball_model(config, position, rotation, false));
        ctx.submit(Primitive::Quads, &self.ball_facets);

        ctx.end_frame()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::MockWindow;
    use crate::render::{rgba8, RecordingContext};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn demo() -> BoingDemo {
        BoingDemo::with_ball(BoingBall::with_rng(
            &BoingConfig::default(),
            StdRng::seed_from_u64(3),
        ))
    }

    #[test]
    fn test_ball_facets_on_sphere() {
        let facets = ball_facets(70.0, false);
        assert_eq!(facets.len(), 8 * 16 * 4);
        for vertex in &facets {
            assert!((vertex.position().length() - 70.0).abs() < 1e-3);
        }

        let white = rgba8(WHITE.extend(1.0));
        let red = rgba8(RED.extend(1.0));
        assert_eq!(facets[0].color, white);
        assert_eq!(facets[4].color, red);
        // 下一条纬带颜色错开
        assert_eq!(facets[16 * 4].color, red);
    }

    #[test]
    fn test_shadow_is_grey() {
        let grey = rgba8(SHADOW.extend(1.0));
        assert!(ball_facets(70.0, true).iter().all(|v| v.color == grey));
    }

    #[test]
    fn test_grid_lines() {
        let grid = grid_lines(315.0);
        assert_eq!(grid.len(), 26 * 4);
        // 第一条竖线：NE, NW, SW, SE
        assert_eq!(grid[0].position(), Vec3::new(-155.5, 157.5, GRID_Z));
        assert_eq!(grid[1].position(), Vec3::new(-157.5, 157.5, GRID_Z));
        assert_eq!(grid[2].position(), Vec3::new(-157.5, -159.5, GRID_Z));
        // 第一条横线
        assert_eq!(grid[13 * 4].position(), Vec3::new(159.5, 157.5, GRID_Z));
    }

    #[test]
    fn test_ball_is_visible() {
        let config = BoingConfig::default();
        let camera = boing_projection(&config, 1.0) * boing_view(&config);
        for shadow in [false, true] {
            let model = ball_model(&config, Vec2::ZERO, 45.0, shadow);
            let clip = camera * model * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(clip.w > 0.0);
            assert!(ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0);
            assert!(ndc.z > 0.0 && ndc.z < 1.0);
        }
    }

    #[test]
    fn test_frame_draw_order() {
        let mut demo = demo();
        let mut ctx = RecordingContext::new(400, 400);
        demo.init(&mut ctx).unwrap();
        demo.frame(
            &mut ctx,
            FrameTime {
                elapsed_seconds: 0.016,
                delta_seconds: 0.016,
            },
        )
        .unwrap();

        let frame = ctx.last_frame().unwrap();
        assert_eq!(frame.clear, CLEAR_COLOR);
        assert_eq!(frame.draws.len(), 3);
        assert_eq!(frame.draws[0].vertices[0].color, rgba8(SHADOW.extend(1.0)));
        assert_eq!(frame.draws[1].vertices[0].color, rgba8(PURPLE.extend(1.0)));
        assert_eq!(frame.draws[0].state.cull, CullMode::Front);
        assert_eq!(frame.draws[1].state, DrawState::FLAT);
        assert!(frame.draws.iter().all(|d| !d.state.depth_test));
    }

    #[test]
    fn test_drag_moves_ball() {
        let mut demo = demo();
        let window = MockWindow::new(400, 400);

        demo.handle_input(&InputEvent::MouseMoved { x: 100.0, y: 300.0 }, &window);
        assert!(!demo.ball().is_overridden());

        demo.handle_input(
            &InputEvent::MouseButtonPressed {
                button: MouseButton::Left,
            },
            &window,
        );
        assert_eq!(demo.ball().position(), Vec2::new(100.0, 100.0));

        demo.handle_input(&InputEvent::MouseMoved { x: 250.0, y: 150.0 }, &window);
        assert_eq!(demo.ball().position(), Vec2::new(-50.0, -50.0));

        let mut ctx = RecordingContext::new(400, 400);
        demo.frame(
            &mut ctx,
            FrameTime {
                elapsed_seconds: 0.1,
                delta_seconds: 0.1,
            },
        )
        .unwrap();
        assert_eq!(demo.ball().position(), Vec2::new(-50.0, -50.0));

        demo.handle_input(
            &InputEvent::MouseButtonReleased {
                button: MouseButton::Left,
            },
            &window,
        );
        assert!(!demo.ball().is_overridden());
    }

    #[test]
    fn test_square_window() {
        let base = WindowConfig::default();
        let square = BoingDemo::window_config(&base);
        assert_eq!(square.width, square.height);
        assert_eq!(square.height, base.height);
    }
}
