//! 分屏视图：四个视口观察同一个圆环
//!
//! 左上俯视、左下正视、右下侧视，均为正交投影的线框；右上是带光照的透视
//! 视图。在正交视口里按住左键拖动可以旋转圆环，被选中的视口加黄色边框。

use crate::config::WindowConfig;
use crate::core::error::DemoResult;
use crate::core::{Demo, FrameTime};
use crate::platform::{InputEvent, MouseButton, Window};
use crate::render::scene::{shade, Material, PointLight};
use crate::render::{
    BlendMode, CullMode, DrawState, GraphicsContext, LitVertex, Primitive, Vertex, Viewport,
};
use glam::{Mat3, Mat4, Vec2, Vec3};
use std::f32::consts::TAU;

pub const TITLE: &str = "Split view demo";

pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

const BACKGROUND: Vec3 = Vec3::new(0.05, 0.05, 0.2);
const GRID_COLOR: Vec3 = Vec3::new(0.0, 0.5, 0.5);
const GRID_SCALE: f32 = 0.5;
const GRID_STEPS: usize = 12;
const BORDER_COLOR: Vec3 = Vec3::new(1.0, 1.0, 0.6);

const TORUS_MAJOR: f32 = 1.5;
const TORUS_MINOR: f32 = 0.5;
const TORUS_MAJOR_RES: usize = 32;
const TORUS_MINOR_RES: usize = 32;

/// 拖动一个像素旋转的角度
const DEGREES_PER_PIXEL: f32 = 0.5;

const TORUS_MATERIAL: Material = Material {
    diffuse: Vec3::new(1.0, 0.8, 0.8),
    specular: Vec3::splat(0.6),
    shininess: 20.0,
};

const TORUS_LIGHT: PointLight = PointLight {
    position: Vec3::new(0.0, 8.0, 8.0),
    ambient: Vec3::new(0.2, 0.2, 0.3),
    diffuse: Vec3::ONE,
    specular: Vec3::ONE,
};

/// 网格线：混合、深度测试但不写深度
const GRID_STATE: DrawState = DrawState {
    blend: BlendMode::Alpha,
    depth_test: true,
    depth_write: false,
    cull: CullMode::None,
    wireframe: false,
};

const WIREFRAME_STATE: DrawState = DrawState {
    blend: BlendMode::Alpha,
    depth_test: true,
    depth_write: true,
    cull: CullMode::None,
    wireframe: true,
};

/// 四个视口，按 [`Viewport::quadrants`] 的顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// 左上，从上方俯视
    Top,
    /// 右上，透视
    Perspective,
    /// 左下，从前方看
    Front,
    /// 右下，从右侧看
    Side,
}

impl View {
    pub const ALL: [View; 4] = [View::Top, View::Perspective, View::Front, View::Side];

    /// 光标所在的视口（像素坐标，原点在左上角）
    pub fn at(x: f32, y: f32, width: u32, height: u32) -> Self {
        let right = x >= (width / 2) as f32;
        let bottom = y >= (height / 2) as f32;
        match (right, bottom) {
            (false, false) => View::Top,
            (true, false) => View::Perspective,
            (false, true) => View::Front,
            (true, true) => View::Side,
        }
    }

    fn index(self) -> usize {
        match self {
            View::Top => 0,
            View::Perspective => 1,
            View::Front => 2,
            View::Side => 3,
        }
    }

    pub fn viewport(self, width: u32, height: u32) -> Viewport {
        Viewport::quadrants(width, height)[self.index()]
    }

    pub fn eye(self) -> Vec3 {
        match self {
            // 稍微偏离 Y 轴，避免与上方向共线
            View::Top => Vec3::new(0.0, 10.0, 1e-3),
            View::Perspective => Vec3::new(3.0, 1.5, 3.0),
            View::Front => Vec3::new(0.0, 0.0, 10.0),
            View::Side => Vec3::new(10.0, 0.0, 0.0),
        }
    }

    pub fn camera(self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    /// 边框左下角，在 0..2 的整窗坐标中
    fn border_origin(self) -> Vec2 {
        let index = self.index();
        Vec2::new((index & 1) as f32, (1 - index / 2) as f32)
    }
}

/// 圆环的旋转（单位为拖动像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TorusRotation {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TorusRotation {
    /// 在视口内拖动，每个视口把水平和竖直位移映射到不同的轴
    pub fn drag(&mut self, view: View, dx: i32, dy: i32) {
        match view {
            View::Top => {
                self.x += dy;
                self.z += dx;
            }
            View::Front => {
                self.x += dy;
                self.y += dx;
            }
            View::Side => {
                self.y += dx;
                self.z += dy;
            }
            View::Perspective => {}
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let radians = |steps: i32| (steps as f32 * DEGREES_PER_PIXEL).to_radians();
        Mat4::from_rotation_x(radians(self.x))
            * Mat4::from_rotation_y(radians(self.y))
            * Mat4::from_rotation_z(radians(self.z))
    }
}

/// 圆环表面（四边形列表），绕 Y 轴
pub fn torus_quads() -> Vec<LitVertex> {
    let point = |s: f32, t: f32| {
        let (sin_s, cos_s) = (s * TAU / TORUS_MINOR_RES as f32).sin_cos();
        let (sin_t, cos_t) = (t * TAU / TORUS_MAJOR_RES as f32).sin_cos();
        let ring = TORUS_MAJOR + TORUS_MINOR * cos_s;
        let position = Vec3::new(ring * cos_t, TORUS_MINOR * sin_s, ring * sin_t);
        let center = Vec3::new(TORUS_MAJOR * cos_t, 0.0, TORUS_MAJOR * sin_t);
        LitVertex::new(position, (position - center).normalize())
    };

    let mut quads = Vec::with_capacity(TORUS_MINOR_RES * TORUS_MAJOR_RES * 4);
    for i in 0..TORUS_MINOR_RES {
        let s_outer = ((i + 1) % TORUS_MINOR_RES) as f32 + 0.5;
        let s_inner = i as f32 + 0.5;
        for j in 0..TORUS_MAJOR_RES {
            let t0 = j as f32;
            let t1 = ((j + 1) % TORUS_MAJOR_RES) as f32;
            quads.extend_from_slice(&[
                point(s_outer, t0),
                point(s_inner, t0),
                point(s_inner, t1),
                point(s_outer, t1),
            ]);
        }
    }
    quads
}

/// 平面网格线，`steps` 条横线加 `steps` 条竖线
pub fn grid_lines(scale: f32, steps: usize) -> Vec<Vertex> {
    let extent = scale * 0.5 * steps.saturating_sub(1) as f32;
    let mut lines = Vec::with_capacity(steps * 4);
    for i in 0..steps {
        let y = -extent + i as f32 * scale;
        lines.push(Vertex::colored(Vec3::new(-extent, y, 0.0), GRID_COLOR));
        lines.push(Vertex::colored(Vec3::new(extent, y, 0.0), GRID_COLOR));
    }
    for i in 0..steps {
        let x = -extent + i as f32 * scale;
        lines.push(Vertex::colored(Vec3::new(x, -extent, 0.0), GRID_COLOR));
        lines.push(Vertex::colored(Vec3::new(x, extent, 0.0), GRID_COLOR));
    }
    lines
}

/// 正交视口的投影，纵向固定为 -3..3
pub fn ortho_projection(aspect_ratio: f32) -> Mat4 {
    Mat4::orthographic_rh(-3.0 * aspect_ratio, 3.0 * aspect_ratio, -3.0, 3.0, 1.0, 50.0)
}

pub fn perspective_projection(aspect_ratio: f32) -> Mat4 {
    Mat4::perspective_rh(65f32.to_radians(), aspect_ratio, 1.0, 50.0)
}

fn full_screen_quad(color: Vec3) -> Vec<Vertex> {
    [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
        .into_iter()
        .map(|(x, y)| Vertex::colored(Vec3::new(x, y, 0.5), color))
        .collect()
}

fn border_strip() -> Vec<Vertex> {
    [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]
        .into_iter()
        .map(|(x, y)| Vertex::colored(Vec3::new(x, y, 0.0), BORDER_COLOR))
        .collect()
}

pub struct SplitViewDemo {
    torus: Vec<LitVertex>,
    wireframe: Vec<Vertex>,
    lit: Vec<Vertex>,
    grid: Vec<Vertex>,
    background: Vec<Vertex>,
    border: Vec<Vertex>,
    rotation: TorusRotation,
    active: Option<View>,
    cursor: Vec2,
}

impl Default for SplitViewDemo {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitViewDemo {
    pub fn new() -> Self {
        let torus = torus_quads();
        let wireframe = torus
            .iter()
            .map(|v| Vertex::colored(v.position, TORUS_MATERIAL.diffuse))
            .collect();
        Self {
            lit: Vec::with_capacity(torus.len()),
            torus,
            wireframe,
            grid: grid_lines(GRID_SCALE, GRID_STEPS),
            background: full_screen_quad(BACKGROUND),
            border: border_strip(),
            rotation: TorusRotation::default(),
            active: None,
            cursor: Vec2::ZERO,
        }
    }

    /// 正方形窗口，边长取配置高度
    pub fn window_config(base: &WindowConfig) -> WindowConfig {
        WindowConfig {
            width: base.height,
            ..base.clone()
        }
    }

    pub fn rotation(&self) -> TorusRotation {
        self.rotation
    }

    pub fn active_view(&self) -> Option<View> {
        self.active
    }

    /// 透视视口中的光照颜色，光源和相机都在世界空间
    fn relight(&mut self, model: Mat4) {
        let normal_matrix = Mat3::from_mat4(model);
        let eye = View::Perspective.eye();
        self.lit.clear();
        self.lit.extend(self.torus.iter().map(|v| {
            let position = model.transform_point3(v.position);
            let color = shade(
                position,
                normal_matrix * v.normal,
                &TORUS_MATERIAL,
                &[TORUS_LIGHT],
                eye,
            );
            Vertex::colored(v.position, color)
        }));
    }

    fn draw_ortho_view(
        &self,
        ctx: &mut dyn GraphicsContext,
        view: View,
        projection: Mat4,
        model: Mat4,
    ) {
        let (width, height) = ctx.framebuffer_size();
        ctx.set_viewport(Some(view.viewport(width, height)));

        ctx.set_state(DrawState::FLAT);
        ctx.set_transform(Mat4::IDENTITY);
        ctx.submit(Primitive::Quads, &self.background);

        ctx.set_state(GRID_STATE);
        ctx.set_transform(projection * Mat4::look_at_rh(Vec3::Z, Vec3::ZERO, Vec3::Y));
        ctx.submit(Primitive::Lines, &self.grid);

        ctx.set_state(WIREFRAME_STATE);
        ctx.set_transform(projection * view.camera() * model);
        ctx.submit(Primitive::Quads, &self.wireframe);
    }
}

impl Demo for SplitViewDemo {
    fn title(&self) -> &str {
        TITLE
    }

    fn init(&mut self, _ctx: &mut dyn GraphicsContext) -> DemoResult<()> {
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent, window: &dyn Window) {
        match *event {
            InputEvent::MouseMoved { x, y } => {
                if let Some(view) = self.active {
                    let dx = (x - self.cursor.x) as i32;
                    let dy = (y - self.cursor.y) as i32;
                    self.rotation.drag(view, dx, dy);
                }
                self.cursor = Vec2::new(x, y);
            }
            InputEvent::MouseButtonPressed {
                button: MouseButton::Left,
            } => {
                let (width, height) = window.size();
                let view = View::at(self.cursor.x, self.cursor.y, width, height);
                tracing::debug!(target: "app", ?view, "Split view selected");
                self.active = Some(view);
            }
            InputEvent::MouseButtonReleased {
                button: MouseButton::Left,
            } => self.active = None,
            _ => {}
        }
    }

    fn frame(&mut self, ctx: &mut dyn GraphicsContext, _time: FrameTime) -> DemoResult<()> {
        let aspect = ctx.aspect_ratio();
        let model = self.rotation.matrix();
        let ortho = ortho_projection(aspect);

        ctx.begin_frame(CLEAR_COLOR)?;
        ctx.bind_texture(None)?;
        for view in [View::Top, View::Front, View::Side] {
            self.draw_ortho_view(ctx, view, ortho, model);
        }

        self.relight(model);
        let (width, height) = ctx.framebuffer_size();
        ctx.set_viewport(Some(View::Perspective.viewport(width, height)));
        ctx.set_state(DrawState::OPAQUE);
        ctx.set_transform(perspective_projection(aspect) * View::Perspective.camera() * model);
        ctx.submit(Primitive::Quads, &self.lit);

        ctx.set_viewport(None);
        if let Some(view) = self.active.filter(|v| *v != View::Perspective) {
            ctx.set_state(DrawState::FLAT);
            ctx.set_transform(
                Mat4::orthographic_rh(0.0, 2.0, 0.0, 2.0, 0.0, 1.0)
                    * Mat4::from_translation(view.border_origin().extend(0.0)),
            );
            ctx.submit(Primitive::LineStrip, &self.border);
        }
        ctx.end_frame()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::MockWindow;
    use crate::render::{rgba8, RecordingContext};

    fn frame_time() -> FrameTime {
        FrameTime {
            elapsed_seconds: 0.0,
            delta_seconds: 0.0,
        }
    }

    fn press_at(demo: &mut SplitViewDemo, window: &MockWindow, x: f32, y: f32) {
        demo.handle_input(&InputEvent::MouseMoved { x, y }, window);
        demo.handle_input(
            &InputEvent::MouseButtonPressed {
                button: MouseButton::Left,
            },
            window,
        );
    }

    #[test]
    fn test_torus_surface() {
        let quads = torus_quads();
        assert_eq!(quads.len(), 32 * 32 * 4);
        for v in &quads {
            let ring = Vec3::new(v.position.x, 0.0, v.position.z).normalize() * TORUS_MAJOR;
            assert!(((v.position - ring).length() - TORUS_MINOR).abs() < 1e-4);
            assert!((v.normal.length() - 1.0).abs() < 1e-4);
            assert!(v.normal.dot(v.position - ring) > 0.0);
        }
    }

    #[test]
    fn test_grid_lines() {
        let lines = grid_lines(0.5, 12);
        assert_eq!(lines.len(), 48);
        assert_eq!(lines[0].position, [-2.75, -2.75, 0.0]);
        assert_eq!(lines[1].position, [2.75, -2.75, 0.0]);
        assert_eq!(lines[47].position, [2.75, 2.75, 0.0]);
    }

    #[test]
    fn test_view_under_cursor() {
        assert_eq!(View::at(10.0, 10.0, 500, 500), View::Top);
        assert_eq!(View::at(250.0, 10.0, 500, 500), View::Perspective);
        assert_eq!(View::at(10.0, 300.0, 500, 500), View::Front);
        assert_eq!(View::at(499.0, 499.0, 500, 500), View::Side);
        for view in View::ALL {
            let viewport = view.viewport(500, 500);
            let centre = (viewport.x + viewport.width / 2, viewport.y + viewport.height / 2);
            assert_eq!(View::at(centre.0 as f32, centre.1 as f32, 500, 500), view);
        }
    }

    #[test]
    fn test_drag_rotates_per_view() {
        let mut demo = SplitViewDemo::new();
        let window = MockWindow::new(500, 500);

        press_at(&mut demo, &window, 100.0, 100.0);
        assert_eq!(demo.active_view(), Some(View::Top));
        demo.handle_input(&InputEvent::MouseMoved { x: 110.0, y: 104.0 }, &window);
        assert_eq!(demo.rotation(), TorusRotation { x: 4, y: 0, z: 10 });

        demo.handle_input(
            &InputEvent::MouseButtonReleased {
                button: MouseButton::Left,
            },
            &window,
        );
        assert_eq!(demo.active_view(), None);
        demo.handle_input(&InputEvent::MouseMoved { x: 400.0, y: 400.0 }, &window);
        assert_eq!(demo.rotation(), TorusRotation { x: 4, y: 0, z: 10 });

        press_at(&mut demo, &window, 400.0, 400.0);
        assert_eq!(demo.active_view(), Some(View::Side));
        demo.handle_input(&InputEvent::MouseMoved { x: 403.5, y: 398.0 }, &window);
        assert_eq!(demo.rotation(), TorusRotation { x: 4, y: 3, z: 8 });

        demo.handle_input(
            &InputEvent::MouseButtonReleased {
                button: MouseButton::Left,
            },
            &window,
        );
        press_at(&mut demo, &window, 400.0, 100.0);
        assert_eq!(demo.active_view(), Some(View::Perspective));
        demo.handle_input(&InputEvent::MouseMoved { x: 450.0, y: 150.0 }, &window);
        assert_eq!(demo.rotation(), TorusRotation { x: 4, y: 3, z: 8 });
    }

    #[test]
    fn test_frame_layout() {
        let mut demo = SplitViewDemo::new();
        let mut ctx = RecordingContext::new(500, 500);
        demo.init(&mut ctx).unwrap();
        demo.frame(&mut ctx, frame_time()).unwrap();

        let frame = ctx.last_frame().unwrap();
        assert_eq!(frame.clear, CLEAR_COLOR);
        assert_eq!(frame.draws.len(), 10);

        for view in [View::Top, View::Front, View::Side] {
            let draws: Vec<_> = frame.draws_in_viewport(view.viewport(500, 500)).collect();
            assert_eq!(draws.len(), 3, "{:?}", view);
            assert_eq!(draws[0].primitive, Primitive::Quads);
            assert_eq!(draws[0].vertices[0].color, rgba8(BACKGROUND.extend(1.0)));
            assert_eq!(draws[1].primitive, Primitive::Lines);
            assert_eq!(draws[1].vertices.len(), 48);
            assert!(draws[2].state.wireframe);
            assert_eq!(draws[2].vertices.len(), 4096);
        }

        let perspective: Vec<_> = frame
            .draws_in_viewport(View::Perspective.viewport(500, 500))
            .collect();
        assert_eq!(perspective.len(), 1);
        assert_eq!(perspective[0].state, DrawState::OPAQUE);
        assert!(frame.draws.iter().all(|d| d.primitive != Primitive::LineStrip));
    }

    #[test]
    fn test_perspective_view_is_lit() {
        let mut demo = SplitViewDemo::new();
        let mut ctx = RecordingContext::new(500, 500);
        demo.frame(&mut ctx, frame_time()).unwrap();

        let frame = ctx.last_frame().unwrap();
        let lit = &frame
            .draws_in_viewport(View::Perspective.viewport(500, 500))
            .next()
            .unwrap()
            .vertices;
        let torus = torus_quads();
        for (vertex, source) in lit.iter().zip(&torus).step_by(97) {
            let expected = shade(
                source.position,
                source.normal,
                &TORUS_MATERIAL,
                &[TORUS_LIGHT],
                View::Perspective.eye(),
            );
            assert_eq!(vertex.color, rgba8(expected.extend(1.0)));
        }
    }

    #[test]
    fn test_border_marks_active_ortho_view() {
        let mut demo = SplitViewDemo::new();
        let window = MockWindow::new(500, 500);
        let mut ctx = RecordingContext::new(500, 500);

        press_at(&mut demo, &window, 100.0, 400.0);
        demo.frame(&mut ctx, frame_time()).unwrap();
        let border = ctx.last_frame().unwrap().draws.last().unwrap().clone();
        assert_eq!(border.primitive, Primitive::LineStrip);
        assert_eq!(border.viewport, None);
        assert_eq!(border.vertices.len(), 5);
        // 左下视口的边框从原点开始
        let corner = border.transform.project_point3(Vec3::ZERO);
        assert!((corner.x + 1.0).abs() < 1e-5 && (corner.y + 1.0).abs() < 1e-5);

        press_at(&mut demo, &window, 100.0, 100.0);
        demo.frame(&mut ctx, frame_time()).unwrap();
        let border = ctx.last_frame().unwrap().draws.last().unwrap().clone();
        let corner = border.transform.project_point3(Vec3::ZERO);
        assert!((corner.y - 0.0).abs() < 1e-5);

        press_at(&mut demo, &window, 400.0, 100.0);
        demo.frame(&mut ctx, frame_time()).unwrap();
        let frame = ctx.last_frame().unwrap();
        assert!(frame.draws.iter().all(|d| d.primitive != Primitive::LineStrip));
    }
}
