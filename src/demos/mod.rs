//! 演示程序
//!
//! - [`particles`]：粒子喷泉，可选独立物理线程
//! - [`boing`]：Amiga 弹球
//! - [`wave`]：压力波网格
//! - [`gears`]：三个咬合的齿轮
//! - [`heightmap`]：自定义着色器绘制的高度图
//! - [`splitview`]：四个视口观察同一个圆环
//! - [`simple`]：旋转三角形

pub mod boing;
pub mod gears;
pub mod heightmap;
pub mod particles;
pub mod simple;
pub mod splitview;
pub mod wave;

pub use boing::BoingDemo;
pub use gears::GearsDemo;
pub use heightmap::HeightMapDemo;
pub use particles::ParticlesDemo;
pub use simple::SimpleDemo;
pub use splitview::SplitViewDemo;
pub use wave::WaveDemo;
