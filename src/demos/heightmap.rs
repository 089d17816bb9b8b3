//! 高度图
//!
//! 网格线用自定义着色器画成单一绿色。地形每隔一段时间随机隆起一次，
//! 达到迭代上限后保持不变。Escape 退出。

use crate::config::{HeightMapConfig, WindowConfig};
use crate::core::error::DemoResult;
use crate::core::{Demo, FrameTime};
use crate::physics::heightmap::{line_indices, HeightMap};
use crate::platform::{InputEvent, Window};
use crate::render::{DrawState, GraphicsContext, Primitive, ShaderDesc, ShaderId, Vertex};
use glam::{Mat4, Vec3};

pub const TITLE: &str = "Heightmap demo";

pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// 按弧度代入 `tan`，等效垂直视角约 58 度
const VIEW_ANGLE: f32 = 45.0;
const Z_NEAR: f32 = 1.0;
const Z_FAR: f32 = 100.0;
const CAMERA_OFFSET: Vec3 = Vec3::new(-5.0, -5.0, -20.0);

/// 只用位置属性，输出固定颜色
pub const HEIGHTMAP_WGSL: &str = r#"
struct DrawUniform {
    transform: mat4x4<f32>,
};
@group(0) @binding(0) var<uniform> draw: DrawUniform;

@vertex
fn vs_main(@location(2) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return draw.transform * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(0.2, 1.0, 0.2, 1.0);
}
"#;

pub fn heightmap_projection(aspect_ratio: f32) -> Mat4 {
    let f = 1.0 / (VIEW_ANGLE / 2.0).tan();
    Mat4::perspective_rh(2.0 * (1.0 / f).atan(), aspect_ratio, Z_NEAR, Z_FAR)
}

pub fn heightmap_transform(aspect_ratio: f32) -> Mat4 {
    heightmap_projection(aspect_ratio) * Mat4::from_translation(CAMERA_OFFSET)
}

pub struct HeightMapDemo {
    map: HeightMap,
    indices: Vec<u32>,
    lines: Vec<Vertex>,
    shader_desc: ShaderDesc,
    shader: Option<ShaderId>,
    max_iterations: u32,
    update_interval: f64,
    last_update: f64,
}

impl HeightMapDemo {
    pub fn new(config: &HeightMapConfig) -> Self {
        Self::with_shader(config, ShaderDesc::wgsl("heightmap shader", HEIGHTMAP_WGSL))
    }

    /// 使用指定着色器绘制网格线
    pub fn with_shader(config: &HeightMapConfig, shader: ShaderDesc) -> Self {
        let map = HeightMap::new(config);
        let indices = line_indices(map.grid_vertices());
        let mut demo = Self {
            map,
            lines: Vec::with_capacity(indices.len()),
            indices,
            shader_desc: shader,
            shader: None,
            max_iterations: config.max_iterations,
            update_interval: config.update_interval,
            last_update: 0.0,
        };
        demo.rebuild_lines();
        demo
    }

    /// 4:3 窗口，高度取配置值
    pub fn window_config(base: &WindowConfig) -> WindowConfig {
        WindowConfig {
            width: base.height * 4 / 3,
            ..base.clone()
        }
    }

    pub fn map(&self) -> &HeightMap {
        &self.map
    }

    pub fn shader(&self) -> Option<ShaderId> {
        self.shader
    }

    fn rebuild_lines(&mut self) {
        let points: Vec<Vertex> = self
            .map
            .vertices()
            .map(|p| Vertex::colored(p, Vec3::new(0.2, 1.0, 0.2)))
            .collect();
        self.lines.clear();
        self.lines
            .extend(self.indices.iter().map(|&i| points[i as usize]));
    }

    /// 距上次更新超过间隔时迭代一次
    fn advance(&mut self, elapsed_seconds: f64) {
        if elapsed_seconds - self.last_update <= self.update_interval {
            return;
        }
        if self.map.iterations() < self.max_iterations {
            self.map.update(1);
            self.rebuild_lines();
            tracing::trace!(target: "physics", iteration = self.map.iterations(), "Heightmap updated");
        }
        self.last_update = elapsed_seconds;
    }
}

impl Demo for HeightMapDemo {
    fn title(&self) -> &str {
        TITLE
    }

    fn init(&mut self, ctx: &mut dyn GraphicsContext) -> DemoResult<()> {
        self.shader = Some(ctx.create_shader(&self.shader_desc)?);
        tracing::debug!(target: "render", label = self.shader_desc.label, "Heightmap shader ready");
        Ok(())
    }

    fn handle_input(&mut self, _event: &InputEvent, _window: &dyn Window) {}

    fn frame(&mut self, ctx: &mut dyn GraphicsContext, time: FrameTime) -> DemoResult<()> {
        self.advance(time.elapsed_seconds);

        ctx.begin_frame(CLEAR_COLOR)?;
        ctx.bind_texture(None)?;
        ctx.bind_shader(self.shader)?;
        ctx.set_state(DrawState::FLAT);
        ctx.set_transform(heightmap_transform(ctx.aspect_ratio()));
        ctx.submit(Primitive::Lines, &self.lines);
        ctx.bind_shader(None)?;
        ctx.end_frame()?;
        Ok(())
    }
}
