//! WGSL 着色器描述与校验
//!
//! 所有着色器共用同一套接口：顶点属性 `location(0..=2)` 依次为 uv、颜色、
//! 位置；`group(0)` 是每次绘制的变换矩阵，`group(1)` 是纹理和采样器。
//! 自定义着色器不必使用全部绑定，但不能声明额外的绑定。
//!
//! 创建前先用 naga 解析和校验，失败时返回 [`RenderError::ShaderCompilation`]，
//! 因此无窗口的上下文也能发现着色器错误。

use crate::core::error::{RenderError, RenderResult};
use std::borrow::Cow;

/// 内置着色器：顶点颜色乘以纹理
pub const BUILTIN_WGSL: &str = r#"
struct DrawUniform {
    transform: mat4x4<f32>,
};
@group(0) @binding(0) var<uniform> draw: DrawUniform;
@group(1) @binding(0) var tex: texture_2d<f32>;
@group(1) @binding(1) var samp: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
    @location(2) position: vec3<f32>,
) -> VsOut {
    var out: VsOut;
    out.pos = draw.transform * vec4<f32>(position, 1.0);
    out.uv = uv;
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return textureSample(tex, samp, in.uv) * in.color;
}
"#;

/// 着色器句柄，由 [`super::GraphicsContext::create_shader`] 分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

/// 着色器描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDesc {
    pub label: &'static str,
    pub source: Cow<'static, str>,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
}

impl ShaderDesc {
    /// 入口点为 `vs_main` / `fs_main` 的 WGSL 着色器
    pub fn wgsl(label: &'static str, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label,
            source: source.into(),
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
        }
    }

    pub fn builtin() -> Self {
        Self::wgsl("builtin shader", BUILTIN_WGSL)
    }

    pub fn with_entry_points(mut self, vertex: &'static str, fragment: &'static str) -> Self {
        self.vertex_entry = vertex;
        self.fragment_entry = fragment;
        self
    }

    /// 解析、校验并检查入口点
    pub fn validate(&self) -> RenderResult<()> {
        let module = naga::front::wgsl::parse_str(&self.source).map_err(|e| {
            RenderError::ShaderCompilation(format!(
                "{}: {}",
                self.label,
                e.emit_to_string(&self.source)
            ))
        })?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        );
        validator
            .validate(&module)
            .map_err(|e| RenderError::ShaderCompilation(format!("{}: {}", self.label, e)))?;

        for (entry, stage) in [
            (self.vertex_entry, naga::ShaderStage::Vertex),
            (self.fragment_entry, naga::ShaderStage::Fragment),
        ] {
            let found = module
                .entry_points
                .iter()
                .any(|ep| ep.name == entry && ep.stage == stage);
            if !found {
                return Err(RenderError::ShaderCompilation(format!(
                    "{}: missing {:?} entry point `{}`",
                    self.label, stage, entry
                )));
            }
        }
        Ok(())
    }
}
