//! 无窗口的记录型图形上下文
//!
//! 每次 `submit` 连同当时的状态一起保存；帧历史有上限，超出后丢弃最旧的帧。
//! 着色器只做 naga 校验，不会真正编译。

use super::{
    DrawState, GraphicsContext, Primitive, ShaderDesc, ShaderId, TextureDesc, TextureId, Vertex,
    Viewport,
};
use crate::core::error::{RenderError, RenderResult};
use glam::Mat4;
use std::collections::VecDeque;

/// 一次提交
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub primitive: Primitive,
    pub state: DrawState,
    pub texture: Option<TextureId>,
    pub shader: Option<ShaderId>,
    pub viewport: Option<Viewport>,
    pub transform: Mat4,
    pub vertices: Vec<Vertex>,
}

/// 一帧
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordedFrame {
    pub clear: [f32; 4],
    pub draws: Vec<RecordedDraw>,
}

impl RecordedFrame {
    /// 本帧提交的顶点总数
    pub fn vertex_count(&self) -> usize {
        self.draws.iter().map(|d| d.vertices.len()).sum()
    }

    /// 使用指定状态的提交
    pub fn draws_with_state(&self, state: DrawState) -> impl Iterator<Item = &RecordedDraw> {
        self.draws.iter().filter(move |d| d.state == state)
    }

    /// 限定在指定视口内的提交
    pub fn draws_in_viewport(&self, viewport: Viewport) -> impl Iterator<Item = &RecordedDraw> {
        self.draws
            .iter()
            .filter(move |d| d.viewport == Some(viewport))
    }
}

/// 记录型上下文
pub struct RecordingContext {
    size: (u32, u32),
    textures: Vec<TextureDesc>,
    shaders: Vec<ShaderDesc>,
    frames: VecDeque<RecordedFrame>,
    history: usize,
    current: Option<RecordedFrame>,
    transform: Mat4,
    state: DrawState,
    texture: Option<TextureId>,
    shader: Option<ShaderId>,
    viewport: Option<Viewport>,
    frames_completed: u64,
}

impl RecordingContext {
    pub const DEFAULT_HISTORY: usize = 8;

    pub fn new(width: u32, height: u32) -> Self {
        Self::with_history(width, height, Self::DEFAULT_HISTORY)
    }

    /// 最多保留 `history` 帧（至少 1 帧）
    pub fn with_history(width: u32, height: u32, history: usize) -> Self {
        Self {
            size: (width, height),
            textures: Vec::new(),
            shaders: Vec::new(),
            frames: VecDeque::new(),
            history: history.max(1),
            current: None,
            transform: Mat4::IDENTITY,
            state: DrawState::default(),
            texture: None,
            shader: None,
            viewport: None,
            frames_completed: 0,
        }
    }

    pub fn textures(&self) -> &[TextureDesc] {
        &self.textures
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureDesc> {
        self.textures.get(id.0 as usize)
    }

    pub fn shader(&self, id: ShaderId) -> Option<&ShaderDesc> {
        self.shaders.get(id.0 as usize)
    }

    pub fn frames(&self) -> impl Iterator<Item = &RecordedFrame> {
        self.frames.iter()
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.back()
    }

    /// 已完成的帧数（包括已被丢弃的）
    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    pub fn current_state(&self) -> DrawState {
        self.state
    }
}

impl GraphicsContext for RecordingContext {
    fn framebuffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<TextureId> {
        desc.validate()?;
        self.textures.push(desc.clone());
        Ok(TextureId(self.textures.len() as u32 - 1))
    }

    fn create_shader(&mut self, desc: &ShaderDesc) -> RenderResult<ShaderId> {
        desc.validate()?;
        self.shaders.push(desc.clone());
        Ok(ShaderId(self.shaders.len() as u32 - 1))
    }

    fn begin_frame(&mut self, clear: [f32; 4]) -> RenderResult<()> {
        if self.current.is_some() {
            tracing::warn!(target: "render", "begin_frame called twice, previous frame discarded");
        }
        self.current = Some(RecordedFrame {
            clear,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    fn set_state(&mut self, state: DrawState) {
        self.state = state;
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) -> RenderResult<()> {
        if let Some(id) = texture {
            if id.0 as usize >= self.textures.len() {
                return Err(RenderError::UnknownTexture(id.0));
            }
        }
        self.texture = texture;
        Ok(())
    }

    fn bind_shader(&mut self, shader: Option<ShaderId>) -> RenderResult<()> {
        if let Some(id) = shader {
            if id.0 as usize >= self.shaders.len() {
                return Err(RenderError::UnknownShader(id.0));
            }
        }
        self.shader = shader;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Option<Viewport>) {
        self.viewport = viewport;
    }

    fn submit(&mut self, primitive: Primitive, vertices: &[Vertex]) {
        let Some(frame) = self.current.as_mut() else {
            tracing::warn!(target: "render", "submit outside of a frame ignored");
            return;
        };
        if vertices.len() < primitive.min_vertices() {
            return;
        }
        frame.draws.push(RecordedDraw {
            primitive,
            state: self.state,
            texture: self.texture,
            shader: self.shader,
            viewport: self.viewport,
            transform: self.transform,
            vertices: vertices.to_vec(),
        });
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        let frame = self
            .current
            .take()
            .ok_or_else(|| RenderError::Surface("end_frame without begin_frame".to_string()))?;
        if self.frames.len() == self.history {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
        self.frames_completed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn triangle() -> Vec<Vertex> {
        vec![
            Vertex::colored(Vec3::ZERO, Vec3::X),
            Vertex::colored(Vec3::X, Vec3::Y),
            Vertex::colored(Vec3::Y, Vec3::Z),
        ]
    }

    #[test]
    fn test_records_state_per_draw() {
        let mut ctx = RecordingContext::new(320, 240);
        let texture = ctx
            .create_texture(&TextureDesc::luminance("t", 1, 1, vec![255]))
            .unwrap();

        ctx.begin_frame([0.0; 4]).unwrap();
        ctx.submit(Primitive::Triangles, &triangle());
        ctx.set_state(DrawState::ADDITIVE);
        ctx.bind_texture(Some(texture)).unwrap();
        ctx.set_transform(Mat4::from_scale(Vec3::splat(2.0)));
        ctx.submit(Primitive::Triangles, &triangle());
        ctx.end_frame().unwrap();

        let frame = ctx.last_frame().unwrap();
        assert_eq!(frame.draws.len(), 2);
        assert_eq!(frame.draws[0].state, DrawState::default());
        assert_eq!(frame.draws[0].texture, None);
        assert_eq!(frame.draws[1].texture, Some(texture));
        assert_eq!(frame.draws[1].transform, Mat4::from_scale(Vec3::splat(2.0)));
        assert_eq!(frame.vertex_count(), 6);
        assert_eq!(frame.draws_with_state(DrawState::ADDITIVE).count(), 1);
    }

    #[test]
    fn test_unknown_texture_rejected() {
        let mut ctx = RecordingContext::new(10, 10);
        assert!(matches!(
            ctx.bind_texture(Some(TextureId(3))),
            Err(RenderError::UnknownTexture(3))
        ));
        assert!(ctx.bind_texture(None).is_ok());
    }

    #[test]
    fn test_shader_and_viewport_recorded() {
        let mut ctx = RecordingContext::new(200, 100);
        let shader = ctx.create_shader(&ShaderDesc::builtin()).unwrap();
        assert_eq!(ctx.shader(shader).unwrap().label, "builtin shader");

        let left = Viewport::new(0, 0, 100, 100);
        ctx.begin_frame([0.0; 4]).unwrap();
        ctx.bind_shader(Some(shader)).unwrap();
        ctx.set_viewport(Some(left));
        ctx.submit(Primitive::Lines, &triangle()[..2]);
        ctx.bind_shader(None).unwrap();
        ctx.set_viewport(None);
        ctx.submit(Primitive::Triangles, &triangle());
        ctx.end_frame().unwrap();

        let frame = ctx.last_frame().unwrap();
        assert_eq!(frame.draws[0].shader, Some(shader));
        assert_eq!(frame.draws[0].primitive, Primitive::Lines);
        assert_eq!(frame.draws_in_viewport(left).count(), 1);
        assert_eq!(frame.draws[1].shader, None);
        assert_eq!(frame.draws[1].viewport, None);
    }

    #[test]
    fn test_invalid_shader_rejected() {
        let mut ctx = RecordingContext::new(10, 10);
        let result = ctx.create_shader(&ShaderDesc::wgsl("broken", "@vertex fn"));
        assert!(matches!(result, Err(RenderError::ShaderCompilation(_))));
        assert!(matches!(
            ctx.bind_shader(Some(ShaderId(0))),
            Err(RenderError::UnknownShader(0))
        ));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut ctx = RecordingContext::with_history(10, 10, 2);
        for i in 0..5 {
            ctx.begin_frame([i as f32, 0.0, 0.0, 1.0]).unwrap();
            ctx.end_frame().unwrap();
        }
        assert_eq!(ctx.frames().count(), 2);
        assert_eq!(ctx.frames_completed(), 5);
        assert_eq!(ctx.last_frame().unwrap().clear[0], 4.0);
    }

    #[test]
    fn test_submit_outside_frame_ignored() {
        let mut ctx = RecordingContext::new(10, 10);
        ctx.submit(Primitive::Triangles, &triangle());
        assert!(ctx.end_frame().is_err());
        assert!(ctx.last_frame().is_none());
    }

    #[test]
    fn test_aspect_ratio() {
        let mut ctx = RecordingContext::new(640, 480);
        assert!((ctx.aspect_ratio() - 4.0 / 3.0).abs() < 1e-6);
        ctx.resize(100, 0);
        assert_eq!(ctx.aspect_ratio(), 1.0);
    }
}
