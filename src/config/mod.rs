/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量和命令行覆盖
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod simulation;
pub mod window;

pub use simulation::{BoingConfig, HeightMapConfig, ParticleConfig, WaveConfig};
pub use window::WindowConfig;

/// 默认配置文件名（当前目录）
pub const CONFIG_FILE_TOML: &str = "demo_suite.toml";
pub const CONFIG_FILE_JSON: &str = "demo_suite.json";

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 演示程序主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// 窗口配置
    pub window: WindowConfig,

    /// 粒子喷泉配置
    pub particles: ParticleConfig,

    /// Boing 弹球配置
    pub boing: BoingConfig,

    /// 波浪网格配置
    pub wave: WaveConfig,

    /// 高度图配置
    pub heightmap: HeightMapConfig,

    /// 日志配置
    pub logging: LoggingConfig,
}

impl DemoConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 按扩展名加载（`.json` 走 JSON，其余按 TOML 处理）
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// 使用任意键值来源覆盖配置
    ///
    /// 支持的键：
    /// - `DEMO_WINDOW_WIDTH` / `DEMO_WINDOW_HEIGHT`
    /// - `DEMO_WINDOW_FULLSCREEN` / `DEMO_WINDOW_VSYNC`
    /// - `DEMO_PARTICLES_MAX` / `DEMO_PARTICLES_THREADED`
    /// - `DEMO_LOG_LEVEL`
    ///
    /// 无法解析的值被忽略，保留原配置。
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(width) = lookup("DEMO_WINDOW_WIDTH").and_then(|v| v.parse().ok()) {
            self.window.width = width;
        }
        if let Some(height) = lookup("DEMO_WINDOW_HEIGHT").and_then(|v| v.parse().ok()) {
            self.window.height = height;
        }
        if let Some(fullscreen) = lookup("DEMO_WINDOW_FULLSCREEN").and_then(|v| v.parse().ok()) {
            self.window.fullscreen = fullscreen;
        }
        if let Some(vsync) = lookup("DEMO_WINDOW_VSYNC").and_then(|v| v.parse().ok()) {
            self.window.vsync = vsync;
        }

        if let Some(max) = lookup("DEMO_PARTICLES_MAX").and_then(|v| v.parse().ok()) {
            self.particles.max_particles = max;
        }
        if let Some(threaded) = lookup("DEMO_PARTICLES_THREADED").and_then(|v| v.parse().ok()) {
            self.particles.multithreaded = threaded;
        }

        if let Some(level) = lookup("DEMO_LOG_LEVEL").and_then(|v| LogLevel::parse(&v)) {
            self.logging.level = level;
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.window.validate()?;
        self.particles.validate()?;
        self.boing.validate()?;
        self.wave.validate()?;
        self.heightmap.validate()?;
        Ok(())
    }

    /// 用户级配置文件路径（平台配置目录下的 `demo_suite/config.toml`）
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("demo_suite").join("config.toml"))
    }

    /// 按查找顺序排列的候选配置文件
    ///
    /// 1. ./demo_suite.toml
    /// 2. ./demo_suite.json
    /// 3. 用户级配置，见 [`DemoConfig::user_config_path`]
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE_TOML), PathBuf::from(CONFIG_FILE_JSON)];
        candidates.extend(Self::user_config_path());
        candidates
    }

    /// 查找第一个存在的候选配置文件
    pub fn locate() -> Option<PathBuf> {
        Self::first_existing(Self::candidate_paths())
    }

    fn first_existing<I>(candidates: I) -> Option<PathBuf>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        candidates.into_iter().find(|path| path.is_file())
    }

    /// 自动查找并加载配置文件，找不到或解析失败时使用默认配置
    pub fn load_or_default() -> Self {
        match Self::locate() {
            Some(path) => match Self::from_file(&path) {
                Ok(config) => {
                    tracing::info!(target: "config", "Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::warn!(target: "config", "Ignoring {:?}: {}", path, e);
                    Self::default()
                }
            },
            None => {
                tracing::debug!(target: "config", "Using default configuration");
                Self::default()
            }
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（`RUST_LOG` 未设置时生效）
    pub level: LogLevel,

    /// 是否带上线程名
    pub thread_names: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            thread_names: true,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    /// 解析级别名（大小写不敏感）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// 对应的 `EnvFilter` 指令
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// 命令行 `-v` 计数提升后的级别
    pub fn raised_by(self, verbosity: u8) -> Self {
        let order = [Self::Error, Self::Warn, Self::Info, Self::Debug, Self::Trace];
        let current = order.iter().position(|l| *l == self).unwrap_or(2);
        order[(current + verbosity as usize).min(order.len() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = DemoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.particles.max_particles, 3000);
        assert_eq!(config.window.width, 640);
    }

    #[test]
    fn test_toml_serialization() {
        let config = DemoConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: DemoConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.window.width, parsed.window.width);
        assert_eq!(config.particles.life_span, parsed.particles.life_span);
    }

    #[test]
    fn test_json_serialization() {
        let config = DemoConfig::default();
        let json_str = serde_json::to_string(&config).unwrap();
        let parsed: DemoConfig = serde_json::from_str(&json_str).unwrap();
        assert_eq!(config.window.height, parsed.window.height);
        assert_eq!(config.wave.grid_width, parsed.wave.grid_width);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DemoConfig::from_toml_str(
            r#"
            [particles]
            max_particles = 500
            multithreaded = false
            "#,
        )
        .unwrap();
        assert_eq!(config.particles.max_particles, 500);
        assert!(!config.particles.multithreaded);
        assert_eq!(config.particles.life_span, 8.0);
        assert_eq!(config.window.width, 640);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = DemoConfig::from_toml_str("[window\nwidth = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DEMO_WINDOW_WIDTH", "1024"),
            ("DEMO_WINDOW_FULLSCREEN", "true"),
            ("DEMO_PARTICLES_THREADED", "false"),
            ("DEMO_PARTICLES_MAX", "not-a-number"),
            ("DEMO_LOG_LEVEL", "Debug"),
        ]
        .into_iter()
        .collect();

        let mut config = DemoConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.window.width, 1024);
        assert!(config.window.fullscreen);
        assert!(!config.particles.multithreaded);
        assert_eq!(config.particles.max_particles, 3000);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DemoConfig::default();
        config.boing.animation_speed = 25.0;

        let toml_path = dir.path().join("demo.toml");
        config.save_toml(&toml_path).unwrap();
        assert_eq!(DemoConfig::from_file(&toml_path).unwrap().boing.animation_speed, 25.0);

        let json_path = dir.path().join("demo.json");
        config.save_json(&json_path).unwrap();
        assert_eq!(DemoConfig::from_file(&json_path).unwrap().boing.animation_speed, 25.0);
    }

    #[test]
    fn test_user_config_in_platform_config_dir() {
        let candidates = DemoConfig::candidate_paths();
        assert_eq!(candidates[0], PathBuf::from(CONFIG_FILE_TOML));
        assert_eq!(candidates[1], PathBuf::from(CONFIG_FILE_JSON));

        match dirs::config_dir() {
            Some(dir) => {
                let user = DemoConfig::user_config_path().unwrap();
                assert!(user.starts_with(&dir));
                assert!(user.ends_with(Path::new("demo_suite").join("config.toml")));
                assert_eq!(candidates.last(), Some(&user));
                assert_eq!(candidates.len(), 3);
            }
            None => {
                assert!(DemoConfig::user_config_path().is_none());
                assert_eq!(candidates.len(), 2);
            }
        }
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let user = dir.path().join("demo_suite").join("config.toml");
        fs::create_dir_all(user.parent().unwrap()).unwrap();
        DemoConfig::default().save_toml(&user).unwrap();

        let found = DemoConfig::first_existing(vec![missing.clone(), user.clone()]);
        assert_eq!(found, Some(user));
        assert_eq!(DemoConfig::first_existing(vec![missing]), None);
    }

    #[test]
    fn test_log_level_raise() {
        assert_eq!(LogLevel::Info.raised_by(0), LogLevel::Info);
        assert_eq!(LogLevel::Info.raised_by(1), LogLevel::Debug);
        assert_eq!(LogLevel::Warn.raised_by(9), LogLevel::Trace);
    }
}
