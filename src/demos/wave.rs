//! 波浪模拟
//!
//! 方向键旋转视角，PageUp/PageDown 和滚轮缩放，按住左键拖拽旋转（光标被抓取），
//! 空格重置网格。

use crate::config::WaveConfig;
use crate::core::error::DemoResult;
use crate::core::{Demo, FrameTime};
use crate::physics::WaveGrid;
use crate::platform::{InputEvent, KeyCode, MouseButton, Window};
use crate::render::{DrawState, GraphicsContext, Primitive, Vertex};
use glam::{Mat4, Vec2, Vec3};

pub const TITLE: &str = "Wave Simulation";

pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// 绕网格的观察角度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveView {
    /// 绕 Z 轴（度）
    pub alpha: f32,
    /// 绕 X 轴（度）
    pub beta: f32,
    /// 相机后退距离，不小于 0
    pub zoom: f32,
}

impl Default for WaveView {
    fn default() -> Self {
        Self {
            alpha: 210.0,
            beta: -70.0,
            zoom: 2.0,
        }
    }
}

impl WaveView {
    pub fn rotate(&mut self, d_alpha: f32, d_beta: f32) {
        self.alpha += d_alpha;
        self.beta += d_beta;
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.zoom = (self.zoom + delta).max(0.0);
    }

    /// 按键调整，返回是否处理
    pub fn apply_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Left => self.rotate(5.0, 0.0),
            KeyCode::Right => self.rotate(-5.0, 0.0),
            KeyCode::Up => self.rotate(0.0, -5.0),
            KeyCode::Down => self.rotate(0.0, 5.0),
            KeyCode::PageUp => self.zoom_by(-0.25),
            KeyCode::PageDown => self.zoom_by(0.25),
            _ => return false,
        }
        true
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.zoom))
            * Mat4::from_rotation_x(self.beta.to_radians())
            * Mat4::from_rotation_z(self.alpha.to_radians())
    }
}

pub fn wave_projection(aspect_ratio: f32) -> Mat4 {
    Mat4::perspective_rh(60f32.to_radians(), aspect_ratio, 1.0, 1024.0)
}

/// 网格点的固定位置和颜色，高度之后每帧填入
pub fn grid_vertices(grid: &WaveGrid) -> Vec<Vertex> {
    let (width, height) = (grid.width(), grid.height());
    let half_w = (width / 2) as f32;
    let half_h = (height / 2) as f32;

    let mut vertices = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let checker = (x % 4 < 2) ^ (y % 4 < 2);
            let fx = x as f32 / width as f32;
            let fy = y as f32 / height as f32;
            let color = Vec3::new(if checker { 0.0 } else { 1.0 }, fy, 1.0 - (fx + fy) / 2.0);
            vertices.push(Vertex::colored(
                Vec3::new((x as f32 - half_w) / half_w, (y as f32 - half_h) / half_h, 0.0),
                color,
            ));
        }
    }
    vertices
}

/// 每个四边形的四个网格点索引
pub fn quad_indices(width: usize, height: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity(width.saturating_sub(1) * height.saturating_sub(1) * 4);
    for y in 0..height.saturating_sub(1) {
        for x in 0..width.saturating_sub(1) {
            indices.extend_from_slice(&[
                y * width + x,
                y * width + x + 1,
                (y + 1) * width + x + 1,
                (y + 1) * width + x,
            ]);
        }
    }
    indices
}

pub struct WaveDemo {
    grid: WaveGrid,
    view: WaveView,
    points: Vec<Vertex>,
    indices: Vec<usize>,
    quads: Vec<Vertex>,
    dragging: bool,
    cursor: Option<Vec2>,
}

impl WaveDemo {
    pub fn new(config: &WaveConfig) -> Self {
        let grid = WaveGrid::new(config);
        let points = grid_vertices(&grid);
        let indices = quad_indices(grid.width(), grid.height());
        Self {
            quads: Vec::with_capacity(indices.len()),
            grid,
            view: WaveView::default(),
            points,
            indices,
            dragging: false,
            cursor: None,
        }
    }

    pub fn grid(&self) -> &WaveGrid {
        &self.grid
    }

    pub fn view(&self) -> WaveView {
        self.view
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn set_dragging(&mut self, dragging: bool, window: &dyn Window) {
        self.dragging = dragging;
        if let Err(e) = window.set_cursor_grab(dragging) {
            tracing::warn!(target: "app", "{}", e);
        }
    }

    fn rebuild_quads(&mut self) {
        let width = self.grid.width();
        for (i, point) in self.points.iter_mut().enumerate() {
            point.position[2] = self.grid.height_at(i % width, i / width);
        }
        self.quads.clear();
        self.quads
            .extend(self.indices.iter().map(|&index| self.points[index]));
    }
}

impl Demo for WaveDemo {
    fn title(&self) -> &str {
        TITLE
    }

    fn init(&mut self, _ctx: &mut dyn GraphicsContext) -> DemoResult<()> {
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent, window: &dyn Window) {
        match *event {
            InputEvent::KeyPressed { key: KeyCode::Space } => {
                self.grid.reset();
                tracing::debug!(target: "physics", "Wave grid reset");
            }
            InputEvent::KeyPressed { key } => {
                self.view.apply_key(key);
            }
            InputEvent::MouseButtonPressed {
                button: MouseButton::Left,
            } => self.set_dragging(true, window),
            InputEvent::MouseButtonReleased {
                button: MouseButton::Left,
            } => self.set_dragging(false, window),
            InputEvent::MouseMoved { x, y } => {
                let cursor = Vec2::new(x, y);
                if self.dragging {
                    if let Some(last) = self.cursor {
                        let delta = (cursor - last) / 10.0;
                        self.view.rotate(delta.x, delta.y);
                    }
                }
                self.cursor = Some(cursor);
            }
            InputEvent::MouseWheel { delta_y, .. } => self.view.zoom_by(delta_y / 4.0),
            InputEvent::WindowFocused(false) if self.dragging => self.set_dragging(false, window),
            _ => {}
        }
    }

    fn frame(&mut self, ctx: &mut dyn GraphicsContext, time: FrameTime) -> DemoResult<()> {
        self.grid.advance(time.delta_seconds);
        self.rebuild_quads();

        ctx.begin_frame(CLEAR_COLOR)?;
        ctx.bind_texture(None)?;
        ctx.set_state(DrawState::OPAQUE);
        ctx.set_transform(wave_projection(ctx.aspect_ratio()) * self.view.matrix());
        ctx.submit(Primitive::Quads, &self.quads);
        ctx.end_frame()?;
        Ok(())
    }
}
