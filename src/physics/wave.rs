//! 压力波网格
//!
//! 每个格点保存压力和两个方向的速度。加速度取自相邻格点（环绕）的压力差，
//! 压力由速度散度更新；第 0 行和第 0 列的压力保持不变。

use super::substeps;
use crate::config::WaveConfig;

/// 压力到顶点高度的比例
pub const HEIGHT_SCALE: f64 = 1.0 / 50.0;

/// 波浪网格
#[derive(Debug, Clone)]
pub struct WaveGrid {
    width: usize,
    height: usize,
    animation_speed: f64,
    max_delta_t: f32,
    pressure: Vec<f64>,
    vx: Vec<f64>,
    vy: Vec<f64>,
    ax: Vec<f64>,
    ay: Vec<f64>,
}

impl WaveGrid {
    /// 创建网格并放置初始波峰
    pub fn new(config: &WaveConfig) -> Self {
        let cells = config.grid_width * config.grid_height;
        let mut grid = Self {
            width: config.grid_width,
            height: config.grid_height,
            animation_speed: config.animation_speed as f64,
            max_delta_t: config.max_delta_t,
            pressure: vec![0.0; cells],
            vx: vec![0.0; cells],
            vy: vec![0.0; cells],
            ax: vec![0.0; cells],
            ay: vec![0.0; cells],
        };
        grid.reset();
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn pressure(&self, x: usize, y: usize) -> f64 {
        self.pressure[self.index(x, y)]
    }

    /// 顶点高度
    pub fn height_at(&self, x: usize, y: usize) -> f32 {
        (self.pressure(x, y) * HEIGHT_SCALE) as f32
    }

    /// 所有格点压力之和
    pub fn total_pressure(&self) -> f64 {
        self.pressure.iter().sum()
    }

    /// 中心放置余弦波峰，速度清零
    pub fn reset(&mut self) {
        let half_w = (self.width / 2) as f64;
        let half_h = (self.height / 2) as f64;
        let radius = 0.1 * half_w;
        let scale = std::f64::consts::PI / (self.width * 4) as f64;

        for y in 0..self.height {
            for x in 0..self.width {
                let dx = x as f64 - half_w;
                let dy = y as f64 - half_h;
                let d = (dx * dx + dy * dy).sqrt();
                let i = self.index(x, y);
                self.pressure[i] = if d < radius {
                    -(d * 10.0 * scale).cos() * 100.0
                } else {
                    0.0
                };
                self.vx[i] = 0.0;
                self.vy[i] = 0.0;
            }
        }
    }

    /// 推进 `dt` 秒，按 `max_delta_t` 拆分子步，返回子步数
    pub fn advance(&mut self, dt: f32) -> u32 {
        let mut count = 0;
        for step in substeps(dt, self.max_delta_t) {
            self.step(step as f64);
            count += 1;
        }
        count
    }

    /// 单个子步
    pub fn step(&mut self, dt: f64) {
        let time_step = dt * self.animation_speed;
        let (w, h) = (self.width, self.height);

        for y in 0..h {
            for x in 0..w {
                let i = self.index(x, y);
                self.ax[i] = self.pressure[i] - self.pressure[self.index((x + 1) % w, y)];
                self.ay[i] = self.pressure[i] - self.pressure[self.index(x, (y + 1) % h)];
            }
        }

        for i in 0..self.pressure.len() {
            self.vx[i] += self.ax[i] * time_step;
            self.vy[i] += self.ay[i] * time_step;
        }

        for y in 1..h {
            for x in 1..w {
                let i = self.index(x, y);
                let left = self.index(x - 1, y);
                let below = self.index(x, y - 1);
                self.pressure[i] +=
                    (self.vx[left] - self.vx[i] + self.vy[below] - self.vy[i]) * time_step;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_places_centered_bump() {
        let grid = WaveGrid::new(&WaveConfig::default());
        assert_eq!(grid.pressure(25, 25), -100.0);
        assert!(grid.pressure(26, 25) < 0.0);
        assert_eq!(grid.pressure(0, 0), 0.0);
        assert_eq!(grid.pressure(30, 25), 0.0);
        assert!((grid.height_at(25, 25) + 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_wave_spreads_outward() {
        let mut grid = WaveGrid::new(&WaveConfig::default());
        assert_eq!(grid.pressure(35, 25), 0.0);
        for _ in 0..120 {
            grid.advance(1.0 / 60.0);
        }
        assert!(grid.pressure(35, 25).abs() > 1e-6);
        assert!(grid.pressure(25, 25).is_finite());
    }

    #[test]
    fn test_border_row_and_column_are_fixed() {
        let mut grid = WaveGrid::new(&WaveConfig::default());
        for _ in 0..500 {
            grid.advance(1.0 / 60.0);
        }
        for i in 0..grid.width() {
            assert_eq!(grid.pressure(i, 0), 0.0);
            assert_eq!(grid.pressure(0, i), 0.0);
        }
    }

    #[test]
    fn test_advance_substeps() {
        let mut grid = WaveGrid::new(&WaveConfig::default());
        assert_eq!(grid.advance(0.025), 3);
        assert_eq!(grid.advance(-0.1), 0);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let config = WaveConfig::default();
        let initial = WaveGrid::new(&config);
        let mut grid = initial.clone();
        grid.advance(1.0);
        grid.reset();
        assert_eq!(grid.total_pressure(), initial.total_pressure());
        assert_eq!(grid.pressure(25, 25), initial.pressure(25, 25));
    }
}
