//! wgpu 图形上下文
//!
//! 一帧内的提交先记录在 CPU 侧（顶点、变换、绘制调用），`end_frame` 时统一上传
//! 并在一个渲染通道里绘制。管线按 [`DrawState`] 和着色器懒创建并缓存；每次
//! 绘制的变换矩阵放在一个 256 字节步长的动态偏移 uniform 缓冲里。视口同时
//! 设置为裁剪矩形。

use super::{
    triangulate, wireframe_edges, BlendMode, CullMode, DrawState, GraphicsContext, Primitive,
    ShaderDesc, ShaderId, TextureDesc, TextureId, Vertex, Viewport, WrapMode,
};
use crate::core::error::{RenderError, RenderResult};
use glam::Mat4;
use std::collections::HashMap;
use std::sync::Arc;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const UNIFORM_STRIDE: u64 = 256;
const INITIAL_VERTEX_CAPACITY: u64 = 64 * 1024;
const INITIAL_UNIFORM_CAPACITY: u64 = 64;

/// 每次绘制的 uniform，按动态偏移对齐到 256 字节
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniform {
    transform: [[f32; 4]; 4],
    _pad: [[f32; 4]; 12],
}

impl DrawUniform {
    fn new(transform: Mat4) -> Self {
        Self {
            transform: transform.to_cols_array_2d(),
            _pad: [[0.0; 4]; 12],
        }
    }
}

/// 管线缓存键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    state: DrawState,
    shader: Option<ShaderId>,
}

struct CompiledShader {
    module: wgpu::ShaderModule,
    vertex_entry: &'static str,
    fragment_entry: &'static str,
}

struct DrawCall {
    key: PipelineKey,
    texture: Option<TextureId>,
    viewport: Option<Viewport>,
    uniform: u32,
    first: u32,
    count: u32,
}

#[derive(Default)]
struct FrameRecording {
    clear: [f32; 4],
    vertices: Vec<Vertex>,
    uniforms: Vec<DrawUniform>,
    draws: Vec<DrawCall>,
}

/// 窗口表面上的 wgpu 渲染
pub struct WgpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    builtin_shader: CompiledShader,
    shaders: Vec<CompiledShader>,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    depth_view: wgpu::TextureView,

    uniform_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_capacity: u64,

    vertex_buffer: wgpu::Buffer,
    vertex_capacity: u64,

    texture_layout: wgpu::BindGroupLayout,
    white_texture: wgpu::BindGroup,
    textures: Vec<wgpu::BindGroup>,

    frame: Option<FrameRecording>,
    transform: Mat4,
    state: DrawState,
    texture: Option<TextureId>,
    shader: Option<ShaderId>,
    viewport: Option<Viewport>,
}

impl WgpuContext {
    /// 在窗口上创建表面、设备和基础资源
    pub fn new(window: Arc<Window>, vsync: bool) -> RenderResult<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::SurfaceCreation(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let info = adapter.get_info();
        tracing::info!(
            target: "render",
            "Using adapter {} ({:?}, {:?})",
            info.name,
            info.device_type,
            info.backend
        );

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("demo device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
            },
            None,
        ))
        .map_err(|e| RenderError::DeviceRequest(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        // 顶点颜色按原值显示，优先选非 sRGB 格式
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| RenderError::SurfaceCreation("surface has no formats".to_string()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let builtin_shader = compile_shader(&device, &ShaderDesc::builtin())?;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(64),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("demo pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let uniform_buffer = create_uniform_buffer(&device, INITIAL_UNIFORM_CAPACITY);
        let uniform_bind_group = create_uniform_bind_group(&device, &uniform_layout, &uniform_buffer);
        let vertex_buffer = create_vertex_buffer(&device, INITIAL_VERTEX_CAPACITY);
        let depth_view = create_depth_view(&device, config.width, config.height);

        let white = TextureDesc {
            label: "white",
            width: 1,
            height: 1,
            format: super::TextureFormat::Rgba,
            wrap: WrapMode::Repeat,
            data: vec![255; 4],
        };
        let white_texture = upload_texture(&device, &queue, &texture_layout, &white);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            builtin_shader,
            shaders: Vec::new(),
            pipeline_layout,
            pipelines: HashMap::new(),
            depth_view,
            uniform_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_capacity: INITIAL_UNIFORM_CAPACITY,
            vertex_buffer,
            vertex_capacity: INITIAL_VERTEX_CAPACITY,
            texture_layout,
            white_texture,
            textures: Vec::new(),
            frame: None,
            transform: Mat4::IDENTITY,
            state: DrawState::default(),
            texture: None,
            shader: None,
            viewport: None,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) -> RenderResult<()> {
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }
        let state = key.state;
        let shader = match key.shader {
            Some(id) => self
                .shaders
                .get(id.0 as usize)
                .ok_or(RenderError::UnknownShader(id.0))?,
            None => &self.builtin_shader,
        };

        let blend = match state.blend {
            BlendMode::Opaque => None,
            BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
            BlendMode::Additive => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
        };
        let (topology, cull_mode) = if state.wireframe {
            (wgpu::PrimitiveTopology::LineList, None)
        } else {
            let cull = match state.cull {
                CullMode::None => None,
                CullMode::Front => Some(wgpu::Face::Front),
                CullMode::Back => Some(wgpu::Face::Back),
            };
            (wgpu::PrimitiveTopology::TriangleList, cull)
        };

        let attributes = wgpu::vertex_attr_array![
            0 => Float32x2,
            1 => Unorm8x4,
            2 => Float32x3,
        ];

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("demo pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader.module,
                entry_point: shader.vertex_entry,
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader.module,
                entry_point: shader.fragment_entry,
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.config.format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: state.depth_write,
                depth_compare: if state.depth_test {
                    wgpu::CompareFunction::LessEqual
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ShaderCompilation(err.to_string()));
        }

        tracing::debug!(target: "render", ?key, "Created pipeline");
        self.pipelines.insert(key, pipeline);
        Ok(())
    }

    fn reserve(&mut self, vertex_bytes: u64, uniform_count: u64) {
        if vertex_bytes > self.vertex_capacity {
            self.vertex_capacity = vertex_bytes.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.device, self.vertex_capacity);
        }
        if uniform_count > self.uniform_capacity {
            self.uniform_capacity = uniform_count.next_power_of_two();
            self.uniform_buffer = create_uniform_buffer(&self.device, self.uniform_capacity);
            self.uniform_bind_group =
                create_uniform_bind_group(&self.device, &self.uniform_layout, &self.uniform_buffer);
        }
    }
}

impl GraphicsContext for WgpuContext {
    fn framebuffer_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, width, height);
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<TextureId> {
        desc.validate()?;
        let bind_group = upload_texture(&self.device, &self.queue, &self.texture_layout, desc);
        self.textures.push(bind_group);
        Ok(TextureId(self.textures.len() as u32 - 1))
    }

    fn create_shader(&mut self, desc: &ShaderDesc) -> RenderResult<ShaderId> {
        let shader = compile_shader(&self.device, desc)?;
        self.shaders.push(shader);
        tracing::debug!(target: "render", label = desc.label, "Created shader");
        Ok(ShaderId(self.shaders.len() as u32 - 1))
    }

    fn begin_frame(&mut self, clear: [f32; 4]) -> RenderResult<()> {
        self.frame = Some(FrameRecording {
            clear,
            uniforms: vec![DrawUniform::new(self.transform)],
            ..Default::default()
        });
        Ok(())
    }

    fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        if let Some(frame) = self.frame.as_mut() {
            frame.uniforms.push(DrawUniform::new(transform));
        }
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
        let Some(frame) = self.frame.as_mut() else {
            tracing::warn!(target: "render", "submit outside of a frame ignored");
            return;
        };
        // 线图元总是走线段管线
        let state = self.state.with_wireframe(self.state.wireframe || primitive.is_line());
        let expanded = if state.wireframe {
            wireframe_edges(primitive, vertices)
        } else {
            triangulate(primitive, vertices)
        };
        if expanded.is_empty() {
            return;
        }

        let first = frame.vertices.len() as u32;
        frame.vertices.extend_from_slice(&expanded);
        frame.draws.push(DrawCall {
            key: PipelineKey {
                state,
                shader: self.shader,
            },
            texture: self.texture,
            viewport: self.viewport,
            uniform: frame.uniforms.len() as u32 - 1,
            first,
            count: expanded.len() as u32,
        });
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        let frame = self
            .frame
            .take()
            .ok_or_else(|| RenderError::Surface("end_frame without begin_frame".to_string()))?;

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!(target: "render", "Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::debug!(target: "render", "Surface timeout, frame skipped");
                return Ok(());
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };

        for draw in &frame.draws {
            self.ensure_pipeline(draw.key)?;
        }

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&frame.vertices);
        self.reserve(vertex_bytes.len() as u64, frame.uniforms.len() as u64);
        if !vertex_bytes.is_empty() {
            self.queue.write_buffer(&self.vertex_buffer, 0, vertex_bytes);
        }
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&frame.uniforms));

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("demo frame"),
            });

        {
            let [r, g, b, a] = frame.clear;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("demo pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let (width, height) = (self.config.width, self.config.height);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            for draw in &frame.draws {
                let Some(pipeline) = self.pipelines.get(&draw.key) else {
                    continue;
                };
                let area = match draw.viewport {
                    Some(viewport) => match viewport.clamped(width, height) {
                        Some(area) => area,
                        None => continue,
                    },
                    None => Viewport::new(0, 0, width, height),
                };
                pass.set_viewport(
                    area.x as f32,
                    area.y as f32,
                    area.width as f32,
                    area.height as f32,
                    0.0,
                    1.0,
                );
                pass.set_scissor_rect(area.x, area.y, area.width, area.height);
                let texture = draw
                    .texture
                    .and_then(|id| self.textures.get(id.0 as usize))
                    .unwrap_or(&self.white_texture);

                pass.set_pipeline(pipeline);
                pass.set_bind_group(
                    0,
                    &self.uniform_bind_group,
                    &[(draw.uniform as u64 * UNIFORM_STRIDE) as u32],
                );
                pass.set_bind_group(1, texture, &[]);
                pass.draw(draw.first..draw.first + draw.count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// 先用 naga 校验，再在错误作用域里创建着色器模块
fn compile_shader(device: &wgpu::Device, desc: &ShaderDesc) -> RenderResult<CompiledShader> {
    desc.validate()?;
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(desc.source.clone()),
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::ShaderCompilation(format!("{}: {}", desc.label, err)));
    }
    Ok(CompiledShader {
        module,
        vertex_entry: desc.vertex_entry,
        fragment_entry: desc.fragment_entry,
    })
}

fn create_vertex_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("vertex buffer"),
        size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_uniform_buffer(device: &wgpu::Device, count: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("draw uniform buffer"),
        size: count * UNIFORM_STRIDE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("draw uniform bind group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: wgpu::BufferSize::new(64),
            }),
        }],
    })
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    desc: &TextureDesc,
) -> wgpu::BindGroup {
    let size = wgpu::Extent3d {
        width: desc.width,
        height: desc.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(desc.label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &desc.to_rgba(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * desc.width),
            rows_per_image: Some(desc.height),
        },
        size,
    );

    let address_mode = match desc.wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::Clamp => wgpu::AddressMode::ClampToEdge,
    };
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(desc.label),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(desc.label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    })
}
