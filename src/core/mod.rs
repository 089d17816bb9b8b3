//! 核心模块
//!
//! - `app` - 演示程序 trait 和事件循环
//! - `error` - 错误类型定义
//! - `logging` - 日志初始化
//! - `time` - 帧计时

pub mod app;
pub mod error;
pub mod logging;
pub mod time;

pub use app::{run_demo, Demo};
pub use error::{
    DemoError, DemoResult, PlatformError, PlatformResult, RenderError, RenderResult,
};
pub use logging::init_logging;
pub use time::{FrameTime, Timer};
