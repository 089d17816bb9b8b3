//! 高度图地形
//!
//! 从平坦网格开始，每次迭代随机选一个圆，在圆内按余弦轮廓抬高或压低地面。
//! 顶点 `k = i * n + j` 位于 `(i * step, height, j * step)`。

use crate::config::HeightMapConfig;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 一次隆起
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center_x: f32,
    pub center_z: f32,
    /// 直径
    pub size: f32,
    /// 圆心处的高度变化
    pub displacement: f32,
}

/// 高度图
#[derive(Debug, Clone)]
pub struct HeightMap<R = StdRng> {
    n: usize,
    step: f32,
    map_size: f32,
    max_circle_size: f32,
    max_displacement: f32,
    sign_limit: f32,
    heights: Vec<f32>,
    iterations: u32,
    rng: R,
}

impl HeightMap<StdRng> {
    pub fn new(config: &HeightMapConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> HeightMap<R> {
    /// 使用指定随机源创建平坦地图
    pub fn with_rng(config: &HeightMapConfig, rng: R) -> Self {
        let n = config.grid_vertices.max(2);
        Self {
            n,
            step: config.map_size / (n - 1) as f32,
            map_size: config.map_size,
            max_circle_size: config.max_circle_size,
            max_displacement: config.max_displacement,
            sign_limit: config.displacement_sign_limit,
            heights: vec![0.0; n * n],
            iterations: 0,
            rng,
        }
    }

    /// 每边顶点数
    pub fn grid_vertices(&self) -> usize {
        self.n
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn vertex(&self, index: usize) -> Vec3 {
        Vec3::new(
            (index / self.n) as f32 * self.step,
            self.heights[index],
            (index % self.n) as f32 * self.step,
        )
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        (0..self.heights.len()).map(|i| self.vertex(i))
    }

    /// 随机选取下一个圆
    pub fn random_circle(&mut self) -> Circle {
        let center_x = self.map_size * self.rng.gen::<f32>();
        let center_z = self.map_size * self.rng.gen::<f32>();
        let size = self.max_circle_size * self.rng.gen::<f32>();
        let sign = if self.rng.gen::<f32>() < self.sign_limit {
            -1.0
        } else {
            1.0
        };
        let displacement = sign * self.max_displacement * self.rng.gen::<f32>();
        Circle {
            center_x,
            center_z,
            size,
            displacement,
        }
    }

    /// 按余弦轮廓叠加一个圆：圆心处变化 `displacement`，边缘趋近 0
    pub fn displace(&mut self, circle: Circle) {
        let half = circle.displacement / 2.0;
        for index in 0..self.heights.len() {
            let x = (index / self.n) as f32 * self.step;
            let z = (index % self.n) as f32 * self.step;
            let dx = circle.center_x - x;
            let dz = circle.center_z - z;
            let pd = 2.0 * (dx * dx + dz * dz).sqrt() / circle.size;
            if pd.abs() <= 1.0 {
                self.heights[index] += half + (pd * 3.14).cos() * half;
            }
        }
    }

    /// 执行 `count` 次随机迭代
    pub fn update(&mut self, count: u32) {
        for _ in 0..count {
            let circle = self.random_circle();
            self.displace(circle);
            self.iterations += 1;
        }
    }
}

/// 网格线的顶点索引，每两个一条线段
///
/// 先闭合最后一列和最后一行，再为每个格子画出从左下角出发的三条线。
pub fn line_indices(n: usize) -> Vec<u32> {
    let cells = n.saturating_sub(1);
    let mut indices = Vec::with_capacity(2 * (3 * cells * cells + 2 * cells));
    for i in 0..cells {
        indices.push(((i + 1) * n - 1) as u32);
        indices.push(((i + 2) * n - 1) as u32);
    }
    for i in 0..cells {
        indices.push(((n - 1) * n + i) as u32);
        indices.push(((n - 1) * n + i + 1) as u32);
    }
    for i in 0..cells {
        for j in 0..cells {
            let base = (i * n + j) as u32;
            let n = n as u32;
            indices.extend_from_slice(&[base, base + 1, base, base + n, base, base + n + 1]);
        }
    }
    indices
}
