//! 粒子存储
//!
//! 固定容量的粒子槽位序列。容量在创建后不再改变，索引在整个运行期间稳定；
//! 死亡粒子的槽位通过线性扫描回收。

use glam::Vec3;

/// 单个粒子的全部状态
///
/// 非活跃粒子的运动学字段没有意义，重新激活前必须整体重置。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// 位置
    pub position: Vec3,
    /// 速度
    pub velocity: Vec3,
    /// 颜色（RGB，0-1）
    pub color: Vec3,
    /// 剩余生命（1.0 = 新生，<= 0 = 死亡）
    pub life: f32,
    /// 是否活跃
    pub active: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            color: Vec3::ONE,
            life: 0.0,
            active: false,
        }
    }
}

impl Particle {
    /// 渲染强度：生命的前 75% 保持最亮，之后线性淡出
    pub fn intensity(&self) -> f32 {
        (4.0 * self.life).min(1.0)
    }
}

/// 粒子存储
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleStore {
    particles: Box<[Particle]>,
}

impl ParticleStore {
    /// 创建指定容量的存储，所有粒子初始为非活跃
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: vec![Particle::default(); capacity].into_boxed_slice(),
        }
    }

    /// 容量
    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// 当前活跃粒子数
    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.active).count()
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.particles.iter_mut()
    }

    /// 按索引顺序遍历活跃粒子
    pub fn iter_active(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.active)
    }

    /// 第一个非活跃槽位（用于回收）
    pub fn first_inactive_mut(&mut self) -> Option<&mut Particle> {
        self.particles.iter_mut().find(|p| !p.active)
    }

    /// 将所有粒子置为非活跃
    pub fn clear(&mut self) {
        for particle in self.particles.iter_mut() {
            particle.active = false;
        }
    }
}
