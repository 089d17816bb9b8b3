//! 物理模拟
//!
//! - `particle_store` / `stepper`：粒子喷泉的存储与步进
//! - `parallel`：物理线程与渲染线程的帧同步
//! - `boing`：弹球运动学
//! - `wave`：压力波网格
//! - `heightmap`：随机隆起的高度图地形

pub mod boing;
pub mod heightmap;
pub mod parallel;
pub mod particle_store;
pub mod stepper;
pub mod wave;


pub use boing::BoingBall;
pub use heightmap::HeightMap;
pub use parallel::{
    FrameClock, FrameCounters, FrameSynchronizer, ParticleSimulation, ParticleWorld,
    PhysicsThread,
};
pub use particle_store::{Particle, ParticleStore};
pub use stepper::{GlowLight, ParticleStepper, StepParams, StepReport, StepperStats};
pub use wave::WaveGrid;

/// 把 `total` 拆成若干不超过 `max_step` 的子步
///
/// `total` 不是正数（包括 NaN）时不产生子步；`max_step` 不是正数时整段作为一步。
pub fn substeps(total: f32, max_step: f32) -> Substeps {
    Substeps {
        remaining: total,
        max_step,
    }
}

/// 子步迭代器，见 [`substeps`]
#[derive(Debug, Clone)]
pub struct Substeps {
    remaining: f32,
    max_step: f32,
}

impl Iterator for Substeps {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if !(self.remaining > 0.0) {
            return None;
        }
        let step = if self.max_step > 0.0 && self.remaining > self.max_step {
            self.max_step
        } else {
            self.remaining
        };
        self.remaining -= step;
        Some(step)
    }
}
