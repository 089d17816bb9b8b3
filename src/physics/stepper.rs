//! 粒子物理步进器
//!
//! 把一帧的时间增量拆成不超过 `min_delta_t` 的子步，对每个活跃粒子做
//! 显式欧拉积分和碰撞响应，并按固定的出生间隔回收死亡槽位、诞生新粒子。
//!
//! ```text
//! while remaining > 0:
//!     step = min(remaining, min_delta_t)
//!     update every active particle by step
//!     time_since_birth += step
//!     while time_since_birth >= birth_interval:
//!         time_since_birth -= birth_interval
//!         first inactive slot <- new particle, advanced by time_since_birth
//!     remaining -= step
//! ```

use super::particle_store::{Particle, ParticleStore};
use super::substeps;
use crate::config::ParticleConfig;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 随机数精度：与 12 位随机数一致
const RANDOM_STEPS: u32 = 4096;

/// 步进参数（由 `ParticleConfig` 推导，运行期间不变）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    pub life_span: f32,
    pub birth_interval: f32,
    pub min_delta_t: f32,
    pub gravity: f32,
    pub velocity: f32,
    pub friction: f32,
    pub fountain_height: f32,
    /// 喷泉边缘碰撞半径的平方（含半个粒子大小）
    pub fountain_r2: f32,
    /// 半个粒子大小
    pub half_size: f32,
}

impl From<&ParticleConfig> for StepParams {
    fn from(config: &ParticleConfig) -> Self {
        let half_size = config.particle_size * 0.5;
        let rim = config.fountain_radius + half_size;
        Self {
            life_span: config.life_span,
            birth_interval: config.birth_interval(),
            min_delta_t: config.min_delta_t(),
            gravity: config.gravity,
            velocity: config.velocity,
            friction: config.friction,
            fountain_height: config.fountain_height,
            fountain_r2: rim * rim,
            half_size,
        }
    }
}

/// 喷泉辉光光源：最近一次诞生的粒子的位置和颜色
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowLight {
    pub position: Vec3,
    pub color: Vec3,
}

impl Default for GlowLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 4.0),
            color: Vec3::ZERO,
        }
    }
}

/// 单次 `step` 调用的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// 执行的子步数
    pub substeps: u32,
    /// 诞生的粒子数
    pub births: u32,
    /// 因存储已满而跳过的出生
    pub skipped_births: u32,
    /// 本次调用中死亡的粒子数
    pub deaths: u32,
}

/// 累计统计
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepperStats {
    pub steps: u64,
    pub substeps: u64,
    pub births: u64,
    pub skipped_births: u64,
    pub deaths: u64,
    pub simulated_seconds: f64,
}

/// 粒子物理步进器
#[derive(Clone)]
pub struct ParticleStepper<R = StdRng> {
    params: StepParams,
    /// 距上次出生经过的模拟时间
    time_since_birth: f32,
    glow: GlowLight,
    stats: StepperStats,
    rng: R,
}

impl ParticleStepper<StdRng> {
    /// 使用配置中的种子（或系统熵）创建步进器
    pub fn new(config: &ParticleConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> ParticleStepper<R> {
    /// 使用指定随机数生成器创建步进器
    pub fn with_rng(config: &ParticleConfig, rng: R) -> Self {
        Self {
            params: StepParams::from(config),
            time_since_birth: 0.0,
            glow: GlowLight::default(),
            stats: StepperStats::default(),
            rng,
        }
    }

    pub fn params(&self) -> &StepParams {
        &self.params
    }

    pub fn glow(&self) -> GlowLight {
        self.glow
    }

    pub fn stats(&self) -> StepperStats {
        self.stats
    }

    pub fn time_since_birth(&self) -> f32 {
        self.time_since_birth
    }

    /// 推进整个粒子群 `dt` 秒模拟时间
    ///
    /// `t` 是帧时间，用于新粒子的速度和颜色调制；同一次调用中的所有子步
    /// 共用同一个 `t`。`dt` 为负或 NaN 时不做任何事。
    pub fn step(&mut self, store: &mut ParticleStore, t: f64, dt: f32) -> StepReport {
        let mut report = StepReport::default();

        for step in substeps(dt, self.params.min_delta_t) {
            report.substeps += 1;

            for particle in store.iter_mut() {
                if Self::update_particle(&self.params, particle, step) {
                    report.deaths += 1;
                }
            }

            self.time_since_birth += step;

            while self.time_since_birth >= self.params.birth_interval {
                self.time_since_birth -= self.params.birth_interval;

                let leftover = self.time_since_birth;
                match store.first_inactive_mut() {
                    Some(slot) => {
                        self.init_particle(slot, t + leftover as f64);
                        Self::update_particle(&self.params, slot, leftover);
                        report.births += 1;
                    }
                    None => {
                        report.skipped_births += 1;
                    }
                }
            }
        }

        if report.skipped_births > 0 {
            tracing::trace!(
                target: "physics",
                skipped = report.skipped_births,
                "Particle store full, births skipped"
            );
        }

        self.stats.steps += 1;
        self.stats.substeps += report.substeps as u64;
        self.stats.births += report.births as u64;
        self.stats.skipped_births += report.skipped_births as u64;
        self.stats.deaths += report.deaths as u64;
        if dt > 0.0 {
            self.stats.simulated_seconds += dt as f64;
        }

        report
    }

    /// 更新单个粒子，返回该粒子是否在这一步死亡
    fn update_particle(params: &StepParams, p: &mut Particle, dt: f32) -> bool {
        if !p.active {
            return false;
        }

        p.life -= dt / params.life_span;
        if p.life <= 0.0 {
            p.active = false;
            return true;
        }

        p.velocity.z -= params.gravity * dt;
        p.position += p.velocity * dt;

        if p.velocity.z < 0.0 {
            let rim_top = params.fountain_height + params.half_size;
            let radial2 = p.position.x * p.position.x + p.position.y * p.position.y;

            if radial2 < params.fountain_r2 && p.position.z < rim_top {
                // 喷泉顶部反弹
                p.velocity.z = -params.friction * p.velocity.z;
                p.position.z = rim_top + params.friction * (rim_top - p.position.z);
            } else if p.position.z < params.half_size {
                // 地面反弹
                p.velocity.z = -params.friction * p.velocity.z;
                p.position.z = params.half_size + params.friction * (params.half_size - p.position.z);
            }
        }

        false
    }

    /// 在喷泉口初始化一个新粒子
    fn init_particle(&mut self, p: &mut Particle, t: f64) {
        let step = 1.0 / RANDOM_STEPS as f32;

        let vz = 0.7 + 0.3 * step * self.rng.gen_range(0..RANDOM_STEPS) as f32;
        let xy_angle = std::f32::consts::TAU * step * self.rng.gen_range(0..RANDOM_STEPS) as f32;
        let speed = self.params.velocity * (0.8 + 0.1 * ((0.5 * t).sin() + (1.31 * t).sin()) as f32);

        p.position = Vec3::new(0.0, 0.0, self.params.fountain_height);
        p.velocity = Vec3::new(0.4 * xy_angle.cos(), 0.4 * xy_angle.sin(), vz) * speed;
        p.color = Vec3::new(
            (0.7 + 0.3 * (0.34 * t + 0.1).sin()) as f32,
            (0.6 + 0.4 * (0.63 * t + 1.1).sin()) as f32,
            (0.6 + 0.4 * (0.91 * t + 2.1).sin()) as f32,
        );
        p.life = 1.0;
        p.active = true;

        self.glow = GlowLight {
            position: Vec3::new(
                (0.4 * (1.34 * t).sin()) as f32,
                (0.4 * (3.11 * t).sin()) as f32,
                self.params.fountain_height + 1.0,
            ),
            color: p.color,
        };
    }
}
