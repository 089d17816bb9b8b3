//! 模拟参数配置
//!
//! 各演示中的物理常数都集中在这里，作为不透明的可调参数保留。

use super::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// 粒子喷泉配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// 最大粒子数（存储容量，运行期间不变）
    pub max_particles: usize,
    /// 粒子寿命（秒）
    pub life_span: f32,
    /// 粒子大小（米）
    pub particle_size: f32,
    /// 重力加速度（m/s^2）
    pub gravity: f32,
    /// 基础初速度（m/s）
    pub velocity: f32,
    /// 反弹摩擦（1.0 = 无摩擦，0.0 = 最大摩擦）
    pub friction: f32,
    /// 喷泉高度（米）
    pub fountain_height: f32,
    /// 喷泉半径（米）
    pub fountain_radius: f32,
    /// 子步长上限覆盖；`None` 时取出生间隔的一半
    pub min_delta_t: Option<f32>,
    /// 每批绘制的粒子数
    pub batch_particles: usize,
    /// 是否使用独立物理线程
    pub multithreaded: bool,
    /// 同步器单次等待超时（毫秒）
    pub sync_timeout_ms: u64,
    /// 随机种子；`None` 时从系统熵初始化
    pub seed: Option<u64>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_particles: 3000,
            life_span: 8.0,
            particle_size: 0.7,
            gravity: 9.8,
            velocity: 8.0,
            friction: 0.75,
            fountain_height: 3.0,
            fountain_radius: 1.6,
            min_delta_t: None,
            batch_particles: 70,
            multithreaded: true,
            sync_timeout_ms: 100,
            seed: None,
        }
    }
}

impl ParticleConfig {
    /// 出生间隔：每隔这么久诞生一个新粒子
    pub fn birth_interval(&self) -> f32 {
        self.life_span / self.max_particles as f32
    }

    /// 物理子步长上限
    pub fn min_delta_t(&self) -> f32 {
        self.min_delta_t
            .unwrap_or_else(|| self.birth_interval() * 0.5)
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_particles == 0 {
            return Err(ConfigError::ValidationError(
                "particles.max_particles must be positive".to_string(),
            ));
        }
        if !(self.life_span > 0.0) {
            return Err(ConfigError::ValidationError(
                "particles.life_span must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.friction) {
            return Err(ConfigError::ValidationError(
                "particles.friction must be within 0..=1".to_string(),
            ));
        }
        if let Some(step) = self.min_delta_t {
            if !(step > 0.0) {
                return Err(ConfigError::ValidationError(
                    "particles.min_delta_t must be positive".to_string(),
                ));
            }
        }
        if self.batch_particles == 0 {
            return Err(ConfigError::ValidationError(
                "particles.batch_particles must be positive".to_string(),
            ));
        }
        if self.sync_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "particles.sync_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Boing 弹球配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoingConfig {
    /// 球半径
    pub radius: f32,
    /// 动画速度倍率（50 与最早的 GLUT 版本速度一致）
    pub animation_speed: f32,
    /// 单次物理迭代的最大时间步
    pub max_delta_t: f32,
    /// 左墙偏移
    pub wall_left_offset: f32,
    /// 右墙偏移
    pub wall_right_offset: f32,
    /// 地面边界系数（相对于半个弹跳高度）
    pub floor_bound_factor: f32,
}

impl Default for BoingConfig {
    fn default() -> Self {
        Self {
            radius: 70.0,
            animation_speed: 50.0,
            max_delta_t: 0.02,
            wall_left_offset: 0.0,
            wall_right_offset: 5.0,
            floor_bound_factor: 0.85,
        }
    }
}

impl BoingConfig {
    pub fn bounce_height(&self) -> f32 {
        self.radius * 2.1
    }

    pub fn bounce_width(&self) -> f32 {
        self.radius * 2.1
    }

    /// 球心到网格平面的相对 Z 距离
    pub fn ball_distance(&self) -> f32 {
        self.radius * 2.0 + self.radius * 0.1
    }

    /// 观察者到弹跳区域中心的距离
    pub fn view_distance(&self) -> f32 {
        self.ball_distance() * 3.0 + 200.0
    }

    /// 网格边长
    pub fn grid_size(&self) -> f32 {
        self.radius * 4.5
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.radius > 0.0) || !(self.max_delta_t > 0.0) {
            return Err(ConfigError::ValidationError(
                "boing.radius and boing.max_delta_t must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// 波浪网格配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// 网格宽度（顶点数）
    pub grid_width: usize,
    /// 网格高度（顶点数）
    pub grid_height: usize,
    /// 动画速度倍率
    pub animation_speed: f32,
    /// 单次迭代的最大时间步
    pub max_delta_t: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            grid_width: 50,
            grid_height: 50,
            animation_speed: 10.0,
            max_delta_t: 0.01,
        }
    }
}

impl WaveConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.grid_width < 2 || self.grid_height < 2 {
            return Err(ConfigError::ValidationError(
                "wave grid needs at least 2x2 vertices".to_string(),
            ));
        }
        if !(self.max_delta_t > 0.0) {
            return Err(ConfigError::ValidationError(
                "wave.max_delta_t must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// 高度图配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightMapConfig {
    /// 每边顶点数
    pub grid_vertices: usize,
    /// 地图边长
    pub map_size: f32,
    /// 隆起圆的最大直径
    pub max_circle_size: f32,
    /// 单次隆起的最大高度
    pub max_displacement: f32,
    /// 随机数低于此值时向下凹陷
    pub displacement_sign_limit: f32,
    /// 最多迭代次数，之后地形不再变化
    pub max_iterations: u32,
    /// 两次迭代的间隔（秒）
    pub update_interval: f64,
    /// 随机种子；`None` 时从系统熵初始化
    pub seed: Option<u64>,
}

impl Default for HeightMapConfig {
    fn default() -> Self {
        Self {
            grid_vertices: 80,
            map_size: 10.0,
            max_circle_size: 5.0,
            max_displacement: 1.0,
            displacement_sign_limit: 0.3,
            max_iterations: 200,
            update_interval: 0.2,
            seed: None,
        }
    }
}

impl HeightMapConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.grid_vertices < 2 {
            return Err(ConfigError::ValidationError(
                "heightmap.grid_vertices must be at least 2".to_string(),
            ));
        }
        if !(self.map_size > 0.0) || !(self.max_circle_size > 0.0) {
            return Err(ConfigError::ValidationError(
                "heightmap sizes must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.displacement_sign_limit) {
            return Err(ConfigError::ValidationError(
                "heightmap.displacement_sign_limit must be within 0..=1".to_string(),
            ));
        }
        if !(self.update_interval >= 0.0) {
            return Err(ConfigError::ValidationError(
                "heightmap.update_interval must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
