//! 渲染边界
//!
//! 演示代码只通过 [`GraphicsContext`] 提交几何体：每次提交带一个图元类型和
//! 一组 [`Vertex`]，绘制状态（混合、深度、剔除、线框）、变换矩阵、纹理、
//! 着色器和视口都是上下文里的"当前状态"。
//!
//! - [`wgpu::WgpuContext`]：窗口表面上的真实渲染
//! - [`recorder::RecordingContext`]：无窗口，记录每一帧，用于测试和基准

pub mod particles;
pub mod recorder;
pub mod scene;
pub mod shader;
pub mod wgpu;

pub use particles::{BillboardBasis, ParticleBatcher};
pub use recorder::{RecordedDraw, RecordedFrame, RecordingContext};
pub use shader::{ShaderDesc, ShaderId};

use crate::core::error::{RenderError, RenderResult};
use glam::{Mat4, Vec2, Vec3, Vec4};

/// 交错顶点：纹理坐标、RGBA8 颜色、位置（T2F_C4UB_V3F）
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub uv: [f32; 2],
    pub color: [u8; 4],
    pub position: [f32; 3],
}

impl Vertex {
    pub fn new(position: Vec3, color: [u8; 4], uv: Vec2) -> Self {
        Self {
            uv: uv.to_array(),
            color,
            position: position.to_array(),
        }
    }

    /// 无纹理的不透明顶点
    pub fn colored(position: Vec3, color: Vec3) -> Self {
        Self::new(position, rgba8(color.extend(1.0)), Vec2::ZERO)
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// 带法线的网格顶点，光照在 CPU 上算好后转换为 [`Vertex`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LitVertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl LitVertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

/// 0-1 浮点颜色转换为 RGBA8
pub fn rgba8(color: Vec4) -> [u8; 4] {
    let c = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
}

/// 图元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Triangles,
    TriangleStrip,
    /// 每 4 个顶点一个四边形
    Quads,
    /// 每 2 个顶点一条线段
    Lines,
    /// 首尾相接的折线
    LineStrip,
}

impl Primitive {
    /// 构成一个完整图元所需的最少顶点数
    pub fn min_vertices(self) -> usize {
        match self {
            Self::Lines | Self::LineStrip => 2,
            Self::Triangles | Self::TriangleStrip => 3,
            Self::Quads => 4,
        }
    }

    pub fn is_line(self) -> bool {
        matches!(self, Self::Lines | Self::LineStrip)
    }
}

/// 帧缓冲中的矩形区域（像素，原点在左上角）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 按 2x2 切分帧缓冲：左上、右上、左下、右下
    pub fn quadrants(width: u32, height: u32) -> [Self; 4] {
        let (half_w, half_h) = (width / 2, height / 2);
        let (rest_w, rest_h) = (width - half_w, height - half_h);
        [
            Self::new(0, 0, half_w, half_h),
            Self::new(half_w, 0, rest_w, half_h),
            Self::new(0, half_h, half_w, rest_h),
            Self::new(half_w, half_h, rest_w, rest_h),
        ]
    }

    /// 裁剪到帧缓冲内，面积为 0 时返回 `None`
    pub fn clamped(self, width: u32, height: u32) -> Option<Self> {
        let x = self.x.min(width);
        let y = self.y.min(height);
        let w = self.width.min(width - x);
        let h = self.height.min(height - y);
        (w > 0 && h > 0).then(|| Self::new(x, y, w, h))
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x as f32
            && y >= self.y as f32
            && x < (self.x + self.width) as f32
            && y < (self.y + self.height) as f32
    }

    /// 宽高比，高度为 0 时为 1
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// 混合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Opaque,
    /// `src * a + dst * (1 - a)`
    Alpha,
    /// `src * a + dst`
    Additive,
}

/// 面剔除
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    #[default]
    None,
    Front,
    Back,
}

/// 绘制状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawState {
    pub blend: BlendMode,
    pub depth_test: bool,
    pub depth_write: bool,
    pub cull: CullMode,
    /// 只画边
    pub wireframe: bool,
}

impl Default for DrawState {
    fn default() -> Self {
        Self::OPAQUE
    }
}

impl DrawState {
    /// 深度测试 + 深度写入的不透明绘制
    pub const OPAQUE: Self = Self {
        blend: BlendMode::Opaque,
        depth_test: true,
        depth_write: true,
        cull: CullMode::None,
        wireframe: false,
    };

    /// 不测试深度的 2D 绘制
    pub const FLAT: Self = Self {
        blend: BlendMode::Opaque,
        depth_test: false,
        depth_write: false,
        cull: CullMode::None,
        wireframe: false,
    };

    /// 深度测试但不写深度的叠加混合
    pub const ADDITIVE: Self = Self {
        blend: BlendMode::Additive,
        depth_test: true,
        depth_write: false,
        cull: CullMode::None,
        wireframe: false,
    };

    pub fn with_cull(mut self, cull: CullMode) -> Self {
        self.cull = cull;
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }
}

/// 纹理句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// 纹理像素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 单通道亮度，上传时展开为 `(l, l, l, 255)`
    Luminance,
    Rgba,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Luminance => 1,
            Self::Rgba => 4,
        }
    }
}

/// 纹理寻址
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    Clamp,
}

/// 纹理描述
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub wrap: WrapMode,
    pub data: Vec<u8>,
}

impl TextureDesc {
    pub fn luminance(label: &'static str, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            label,
            width,
            height,
            format: TextureFormat::Luminance,
            wrap: WrapMode::Repeat,
            data,
        }
    }

    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }

    /// 检查尺寸与数据长度是否一致
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidTexture(format!(
                "{}: empty texture {}x{}",
                self.label, self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize * self.format.bytes_per_pixel();
        if self.data.len() != expected {
            return Err(RenderError::InvalidTexture(format!(
                "{}: expected {} bytes, got {}",
                self.label,
                expected,
                self.data.len()
            )));
        }
        Ok(())
    }

    /// RGBA8 像素数据
    pub fn to_rgba(&self) -> Vec<u8> {
        match self.format {
            TextureFormat::Rgba => self.data.clone(),
            TextureFormat::Luminance => self
                .data
                .iter()
                .flat_map(|&l| [l, l, l, 255])
                .collect(),
        }
    }
}

/// 图形上下文
///
/// 一帧的调用顺序：`begin_frame` → 若干次 (`set_transform` / `set_state` /
/// `bind_texture` / `bind_shader` / `set_viewport` / `submit`) → `end_frame`。
/// 状态在帧之间保留。
pub trait GraphicsContext {
    /// 帧缓冲尺寸（像素）
    fn framebuffer_size(&self) -> (u32, u32);

    /// 帧缓冲尺寸变化
    fn resize(&mut self, width: u32, height: u32);

    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<TextureId>;

    /// 编译着色器，失败时返回 [`RenderError::ShaderCompilation`]
    fn create_shader(&mut self, desc: &ShaderDesc) -> RenderResult<ShaderId>;

    /// 开始一帧并清屏（颜色和深度）
    fn begin_frame(&mut self, clear: [f32; 4]) -> RenderResult<()>;

    /// 设置后续提交使用的完整裁剪空间变换
    fn set_transform(&mut self, transform: Mat4);

    fn set_state(&mut self, state: DrawState);

    /// 绑定纹理，`None` 表示不使用纹理
    fn bind_texture(&mut self, texture: Option<TextureId>) -> RenderResult<()>;

    /// 绑定着色器，`None` 表示内置着色器
    fn bind_shader(&mut self, shader: Option<ShaderId>) -> RenderResult<()>;

    /// 限制后续绘制的区域，`None` 表示整个帧缓冲
    fn set_viewport(&mut self, viewport: Option<Viewport>);

    fn submit(&mut self, primitive: Primitive, vertices: &[Vertex]);

    /// 结束并呈现一帧
    fn end_frame(&mut self) -> RenderResult<()>;

    /// 宽高比，高度为 0 时为 1
    fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.framebuffer_size();
        if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }
}

/// 把任意面图元展开为三角形列表，线图元没有面
pub fn triangulate(primitive: Primitive, vertices: &[Vertex]) -> Vec<Vertex> {
    match primitive {
        Primitive::Lines | Primitive::LineStrip => Vec::new(),
        Primitive::Triangles => vertices[..vertices.len() / 3 * 3].to_vec(),
        Primitive::TriangleStrip => {
            let mut out = Vec::with_capacity(vertices.len().saturating_sub(2) * 3);
            for (i, window) in vertices.windows(3).enumerate() {
                // 奇数三角形交换前两个顶点，保持绕序一致
                if i % 2 == 0 {
                    out.extend_from_slice(&[window[0], window[1], window[2]]);
                } else {
                    out.extend_from_slice(&[window[1], window[0], window[2]]);
                }
            }
            out
        }
        Primitive::Quads => {
            let mut out = Vec::with_capacity(vertices.len() / 4 * 6);
            for quad in vertices.chunks_exact(4) {
                out.extend_from_slice(&[quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]]);
            }
            out
        }
    }
}

/// 提取图元的边，结果为线段列表（每两个顶点一条边）
pub fn wireframe_edges(primitive: Primitive, vertices: &[Vertex]) -> Vec<Vertex> {
    let mut out = Vec::new();
    match primitive {
        Primitive::Quads => {
            for quad in vertices.chunks_exact(4) {
                for i in 0..4 {
                    out.push(quad[i]);
                    out.push(quad[(i + 1) % 4]);
                }
            }
        }
        Primitive::Triangles | Primitive::TriangleStrip => {
            for tri in triangulate(primitive, vertices).chunks_exact(3) {
                out.extend_from_slice(&[tri[0], tri[1], tri[1], tri[2], tri[2], tri[0]]);
            }
        }
        Primitive::Lines => out.extend_from_slice(&vertices[..vertices.len() / 2 * 2]),
        Primitive::LineStrip => {
            for pair in vertices.windows(2) {
                out.extend_from_slice(pair);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32) -> Vertex {
        Vertex::colored(Vec3::new(x, 0.0, 0.0), Vec3::ONE)
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        let vertex = Vertex::new(Vec3::new(1.0, 2.0, 3.0), [1, 2, 3, 4], Vec2::new(0.5, 0.25));
        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(&bytes[8..12], &[1, 2, 3, 4]);
        assert_eq!(vertex.position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_rgba8_clamps() {
        assert_eq!(rgba8(Vec4::new(1.0, 0.5, -1.0, 2.0)), [255, 128, 0, 255]);
    }

    #[test]
    fn test_triangulate_quads() {
        let quad: Vec<Vertex> = (0..8).map(|i| v(i as f32)).collect();
        let tris = triangulate(Primitive::Quads, &quad);
        assert_eq!(tris.len(), 12);
        assert_eq!(tris[3], quad[0]);
        assert_eq!(tris[5], quad[3]);
        assert_eq!(tris[6], quad[4]);
    }

    #[test]
    fn test_triangulate_strip_keeps_winding() {
        let strip: Vec<Vertex> = (0..5).map(|i| v(i as f32)).collect();
        let tris = triangulate(Primitive::TriangleStrip, &strip);
        assert_eq!(tris.len(), 9);
        assert_eq!(&tris[3..6], &[strip[2], strip[1], strip[3]]);
        assert!(triangulate(Primitive::TriangleStrip, &strip[..2]).is_empty());
    }

    #[test]
    fn test_incomplete_primitives_dropped() {
        let verts: Vec<Vertex> = (0..5).map(|i| v(i as f32)).collect();
        assert_eq!(triangulate(Primitive::Triangles, &verts).len(), 3);
        assert_eq!(triangulate(Primitive::Quads, &verts).len(), 6);
    }

    #[test]
    fn test_wireframe_edges() {
        let quad: Vec<Vertex> = (0..4).map(|i| v(i as f32)).collect();
        let edges = wireframe_edges(Primitive::Quads, &quad);
        assert_eq!(edges.len(), 8);
        assert_eq!(edges[7], quad[0]);

        let tri: Vec<Vertex> = (0..3).map(|i| v(i as f32)).collect();
        assert_eq!(wireframe_edges(Primitive::Triangles, &tri).len(), 6);
    }

    #[test]
    fn test_line_primitives() {
        let verts: Vec<Vertex> = (0..5).map(|i| v(i as f32)).collect();
        assert!(triangulate(Primitive::Lines, &verts).is_empty());
        assert_eq!(wireframe_edges(Primitive::Lines, &verts), verts[..4].to_vec());

        let strip = wireframe_edges(Primitive::LineStrip, &verts);
        assert_eq!(strip.len(), 8);
        assert_eq!(&strip[2..4], &[verts[1], verts[2]]);
        assert!(Primitive::LineStrip.is_line());
        assert!(!Primitive::Quads.is_line());
    }

    #[test]
    fn test_viewport_quadrants() {
        let [top_left, top_right, bottom_left, bottom_right] = Viewport::quadrants(501, 300);
        assert_eq!(top_left, Viewport::new(0, 0, 250, 150));
        assert_eq!(top_right, Viewport::new(250, 0, 251, 150));
        assert_eq!(bottom_left.y, 150);
        assert_eq!(bottom_right.x + bottom_right.width, 501);
        assert!(top_right.contains(250.0, 0.0));
        assert!(!top_right.contains(249.5, 10.0));
        assert!((top_left.aspect_ratio() - 250.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_viewport_clamped() {
        let viewport = Viewport::new(80, 50, 40, 40);
        assert_eq!(viewport.clamped(100, 100), Some(Viewport::new(80, 50, 20, 40)));
        assert_eq!(viewport.clamped(80, 100), None);
        assert_eq!(Viewport::new(0, 0, 0, 10).clamped(100, 100), None);
    }

    #[test]
    fn test_texture_desc() {
        let desc = TextureDesc::luminance("test", 2, 1, vec![10, 20]);
        assert!(desc.validate().is_ok());
        assert_eq!(desc.to_rgba(), vec![10, 10, 10, 255, 20, 20, 20, 255]);

        let bad = TextureDesc::luminance("bad", 2, 2, vec![0; 3]);
        assert!(matches!(bad.validate(), Err(RenderError::InvalidTexture(_))));
    }

    #[test]
    fn test_draw_state_builders() {
        let state = DrawState::OPAQUE.with_cull(CullMode::Front).with_wireframe(true);
        assert_eq!(state.cull, CullMode::Front);
        assert!(state.wireframe);
        assert!(state.depth_write);
        assert_eq!(DrawState::ADDITIVE.blend, BlendMode::Additive);
        assert!(!DrawState::ADDITIVE.depth_write);
    }
}
