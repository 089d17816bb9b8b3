//! 粒子公告板
//!
//! 每个活跃粒子展开成一个始终朝向相机的四边形。四个角的偏移只取决于视图
//! 矩阵的旋转部分，每帧算一次。

use super::{rgba8, GraphicsContext, Primitive, Vertex};
use crate::physics::ParticleStore;
use glam::{Mat4, Vec3};

/// 四个角的纹理坐标：左下、右下、右上、左上
pub const CORNER_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// 公告板角偏移
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillboardBasis {
    /// 左下、右下、右上、左上
    pub corners: [Vec3; 4],
}

impl BillboardBasis {
    /// 由视图矩阵和粒子大小计算
    pub fn from_view(view: &Mat4, size: f32) -> Self {
        let right = view.row(0).truncate();
        let up = view.row(1).truncate();
        let half = size * 0.5;

        let lower_left = -half * (right + up);
        let lower_right = half * (right - up);

        Self {
            corners: [lower_left, lower_right, -lower_left, -lower_right],
        }
    }
}

/// 粒子顶点批处理
#[derive(Debug, Clone)]
pub struct ParticleBatcher {
    batch_particles: usize,
    vertices: Vec<Vertex>,
}

impl ParticleBatcher {
    pub fn new(batch_particles: usize) -> Self {
        Self {
            batch_particles: batch_particles.max(1),
            vertices: Vec::new(),
        }
    }

    /// 按索引顺序收集所有活跃粒子，返回粒子数
    pub fn collect(&mut self, store: &ParticleStore, basis: &BillboardBasis) -> usize {
        self.vertices.clear();
        for particle in store.iter_active() {
            let color = rgba8(particle.color.extend(particle.intensity()));
            for (corner, uv) in basis.corners.iter().zip(CORNER_UVS) {
                self.vertices.push(Vertex {
                    uv,
                    color,
                    position: (particle.position + *corner).to_array(),
                });
            }
        }
        self.vertices.len() / 4
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// 每批最多 `batch_particles * 4` 个顶点
    pub fn batches(&self) -> std::slice::Chunks<'_, Vertex> {
        self.vertices.chunks(self.batch_particles * 4)
    }

    /// 以四边形提交全部批次，返回批次数
    pub fn draw(&self, ctx: &mut dyn GraphicsContext) -> usize {
        let mut count = 0;
        for batch in self.batches() {
            ctx.submit(Primitive::Quads, batch);
            count += 1;
        }
        count
    }
}
