//! Boing 弹球运动学
//!
//! 球在一个矩形区域内左右弹跳；纵向速度按高度做正弦塑形，近似重力效果。
//! 按住鼠标左键时球跟随光标，物理冻结（自转继续）。

use super::substeps;
use crate::config::BoingConfig;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 弹球
pub struct BoingBall<R = StdRng> {
    config: BoingConfig,
    position: Vec2,
    x_inc: f32,
    y_inc: f32,
    /// 绕 Y 轴的自转角（度，0..360）
    rot_y: f32,
    rot_y_inc: f32,
    override_pos: bool,
    rng: R,
}

impl BoingBall<StdRng> {
    pub fn new(config: &BoingConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> BoingBall<R> {
    pub fn with_rng(config: &BoingConfig, rng: R) -> Self {
        Self {
            config: config.clone(),
            position: Vec2::splat(-config.radius),
            x_inc: 1.0,
            y_inc: 2.0,
            rot_y: 0.0,
            rot_y_inc: 2.0,
            override_pos: false,
            rng,
        }
    }

    pub fn config(&self) -> &BoingConfig {
        &self.config
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// 速度增量 `(x_inc, y_inc)`
    pub fn increments(&self) -> Vec2 {
        Vec2::new(self.x_inc, self.y_inc)
    }

    pub fn rotation(&self) -> f32 {
        self.rot_y
    }

    pub fn spin(&self) -> f32 {
        self.rot_y_inc
    }

    pub fn is_overridden(&self) -> bool {
        self.override_pos
    }

    /// 开始/结束光标跟随
    pub fn set_override(&mut self, enabled: bool) {
        self.override_pos = enabled;
    }

    /// 把球放到光标处（窗口坐标，原点在左上角）
    pub fn follow_cursor(&mut self, cursor: Vec2, window_size: Vec2) {
        self.position = Vec2::new(
            (window_size.x / 2.0).trunc() - cursor.x,
            cursor.y - (window_size.y / 2.0).trunc(),
        );
    }

    /// 推进 `dt` 秒，按 `max_delta_t` 拆分子步
    pub fn advance(&mut self, dt: f32) -> u32 {
        let mut count = 0;
        for step in substeps(dt, self.config.max_delta_t) {
            self.bounce(step);
            self.rot_y = (self.rot_y + self.rot_y_inc * step * self.config.animation_speed)
                .rem_euclid(360.0);
            count += 1;
        }
        count
    }

    /// 单个子步的位置更新
    fn bounce(&mut self, dt: f32) {
        if self.override_pos {
            return;
        }

        let half_width = self.config.bounce_width() / 2.0;
        let half_height = self.config.bounce_height() / 2.0;

        // 墙
        if self.position.x > half_width + self.config.wall_right_offset {
            self.x_inc = -0.5 - 0.75 * self.rng.gen::<f32>();
            self.rot_y_inc = -self.rot_y_inc;
        }
        if self.position.x < -(half_height + self.config.wall_left_offset) {
            self.x_inc = 0.5 + 0.75 * self.rng.gen::<f32>();
            self.rot_y_inc = -self.rot_y_inc;
        }

        // 地面/天花板
        if self.position.y > half_height {
            self.y_inc = -0.75 - self.rng.gen::<f32>();
        }
        if self.position.y < -half_height * self.config.floor_bound_factor {
            self.y_inc = 0.75 + self.rng.gen::<f32>();
        }

        let scale = dt * self.config.animation_speed;
        self.position += Vec2::new(self.x_inc, self.y_inc) * scale;

        // 重力：越高越慢
        let sign = if self.y_inc < 0.0 { -1.0 } else { 1.0 };
        let deg = ((self.position.y + half_height) * 90.0 / self.config.bounce_height())
            .clamp(10.0, 80.0);
        self.y_inc = sign * 4.0 * deg.to_radians().sin();
    }
}
