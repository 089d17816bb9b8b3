//! 粒子喷泉
//!
//! 每帧顺序：地面（纹理、背面剔除）、喷泉（光照三角形带）、粒子（叠加混合、
//! 不写深度）。地面和喷泉带光照与雾，粒子不受影响。
//! `W` 切换线框模式，线框模式下不使用纹理。

use crate::config::ParticleConfig;
use crate::core::error::DemoResult;
use crate::core::{Demo, FrameTime};
use crate::physics::ParticleSimulation;
use crate::platform::{InputEvent, KeyCode, Window};
use crate::render::scene::{
    floor_texture, floor_vertices, fountain_eye, fountain_projection, fountain_strips, fountain_view,
    particle_texture, scene_lights, tessellate_floor, FloorTile, CLEAR_COLOR,
};
use crate::render::{
    BillboardBasis, CullMode, DrawState, GraphicsContext, ParticleBatcher, Primitive, TextureId,
};

pub const TITLE: &str = "Particle engine";

pub struct ParticlesDemo {
    particle_size: f32,
    simulation: ParticleSimulation,
    batcher: ParticleBatcher,
    floor: Vec<FloorTile>,
    particle_texture: Option<TextureId>,
    floor_texture: Option<TextureId>,
    wireframe: bool,
    last_active: usize,
    frames: u64,
}

impl ParticlesDemo {
    /// 创建模拟；多线程模式下会启动物理线程
    pub fn new(config: &ParticleConfig) -> DemoResult<Self> {
        let simulation = ParticleSimulation::from_config(config)?;
        tracing::info!(
            target: "physics",
            threaded = simulation.is_threaded(),
            max_particles = config.max_particles,
            "Particle simulation ready"
        );
        Ok(Self {
            particle_size: config.particle_size,
            simulation,
            batcher: ParticleBatcher::new(config.batch_particles),
            floor: tessellate_floor(),
            particle_texture: None,
            floor_texture: None,
            wireframe: false,
            last_active: 0,
            frames: 0,
        })
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn toggle_wireframe(&mut self) {
        self.wireframe = !self.wireframe;
    }

    pub fn simulation(&self) -> &ParticleSimulation {
        &self.simulation
    }

    /// 上一帧绘制的粒子数
    pub fn active_particles(&self) -> usize {
        self.last_active
    }

    fn texture(&self, texture: Option<TextureId>) -> Option<TextureId> {
        if self.wireframe {
            None
        } else {
            texture
        }
    }
}

impl Demo for ParticlesDemo {
    fn title(&self) -> &str {
        TITLE
    }

    fn init(&mut self, ctx: &mut dyn GraphicsContext) -> DemoResult<()> {
        self.particle_texture = Some(ctx.create_texture(&particle_texture())?);
        self.floor_texture = Some(ctx.create_texture(&floor_texture())?);
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent, _window: &dyn Window) {
        if let InputEvent::KeyPressed { key: KeyCode::W } = event {
            self.toggle_wireframe();
            tracing::debug!(target: "app", wireframe = self.wireframe, "Toggled wireframe");
        }
    }

    fn frame(&mut self, ctx: &mut dyn GraphicsContext, time: FrameTime) -> DemoResult<()> {
        let t = time.elapsed_seconds;
        let view = fountain_view(t);
        let projection = fountain_projection(ctx.aspect_ratio());
        let basis = BillboardBasis::from_view(&view, self.particle_size);

        let batcher = &mut self.batcher;
        let (active, glow) = self.simulation.frame(t, time.delta_seconds, |world| {
            (batcher.collect(&world.store, &basis), world.stepper.glow())
        });
        self.last_active = active;
        let lights = scene_lights(glow);
        let eye = fountain_eye(t);

        ctx.begin_frame(CLEAR_COLOR)?;
        ctx.set_transform(projection * view);

        ctx.set_state(
            DrawState::OPAQUE
                .with_cull(CullMode::Back)
                .with_wireframe(self.wireframe),
        );
        ctx.bind_texture(self.texture(self.floor_texture))?;
        ctx.submit(Primitive::Quads, &floor_vertices(&self.floor, &lights, eye));

        ctx.set_state(DrawState::OPAQUE.with_wireframe(self.wireframe));
        ctx.bind_texture(None)?;
        for strip in fountain_strips(&lights, eye) {
            ctx.submit(Primitive::TriangleStrip, &strip);
        }

        ctx.set_state(DrawState::ADDITIVE.with_wireframe(self.wireframe));
        ctx.bind_texture(self.texture(self.particle_texture))?;
        self.batcher.draw(ctx);

        ctx.end_frame()?;

        self.frames += 1;
        if self.frames % 600 == 0 {
            tracing::debug!(target: "physics", frame = self.frames, active, "Particle count");
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.simulation.shutdown();
        tracing::info!(target: "app", frames = self.frames, "Particle demo stopped");
    }
}
