//! 统一错误处理模块
//!
//! 提供演示程序范围内的统一错误类型定义
//!
//! ## 错误类型分层
//!
//! - **平台层错误** (`PlatformError`): 窗口、事件循环、光标等
//! - **渲染层错误** (`RenderError`): 适配器、设备、着色器、表面等
//! - **配置错误** (`config::ConfigError`): 配置文件读取与校验
//!
//! `DemoError` 汇总以上所有错误，是 `main` 最终看到的类型。
//! 同步器的超时不属于错误，只是一次正常的重新检查。

use crate::config::ConfigError;
use thiserror::Error;

/// 演示程序顶层错误类型
#[derive(Error, Debug)]
pub enum DemoError {
    #[error("Initialization error: {0}")]
    Init(String),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Thread error: {0}")]
    Thread(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 渲染系统错误
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    #[error("Failed to create surface: {0}")]
    SurfaceCreation(String),

    #[error("Failed to request adapter: no compatible GPU found")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    DeviceRequest(String),

    #[error("Failed to create shader: {0}")]
    ShaderCompilation(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Unknown texture id: {0}")]
    UnknownTexture(u32),

    #[error("Invalid texture: {0}")]
    InvalidTexture(String),

    #[error("Unknown shader id: {0}")]
    UnknownShader(u32),
}

/// 平台层错误
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),

    #[error("Cursor grab failed: {0}")]
    CursorGrab(String),
}

/// 结果类型别名
pub type DemoResult<T> = Result<T, DemoError>;
pub type RenderResult<T> = Result<T, RenderError>;
pub type PlatformResult<T> = Result<T, PlatformError>;
