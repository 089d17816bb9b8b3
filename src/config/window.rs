use super::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// 宽度（像素）
    pub width: u32,

    /// 高度（像素）
    pub height: u32,

    /// 全屏模式（无边框全屏，使用当前显示器）
    pub fullscreen: bool,

    /// 垂直同步
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fullscreen: false,
            vsync: true,
        }
    }
}

impl WindowConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid window size {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// 宽高比，高度为 0 时退化为 1
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}
