//! # Demo Suite
//!
//! Small windowed demos built on winit and wgpu.
//!
//! ## Demos
//!
//! - **particles**: a particle fountain whose physics can run on its own thread,
//!   handing frames to the renderer through a condition-variable handshake
//! - **boing**: the bouncing Amiga ball
//! - **wave**: a pressure wave on a 50×50 grid
//! - **simple**: a rotating triangle
//!
//! ## Modules
//!
//! - [`physics`]: particle store, stepper, frame synchronizer, ball and wave kinematics
//! - [`render`]: the `GraphicsContext` seam, wgpu and recording contexts, scene geometry
//! - [`platform`]: winit window and input translation
//! - [`core`]: demo trait, event loop, timing, errors, logging
//! - [`config`]: TOML/JSON configuration

/// Command line interface
pub mod cli;
/// Configuration system
pub mod config;
/// Demo harness, errors, logging and timing
pub mod core;
/// The individual demos
pub mod demos;
/// Particle, ball and wave simulation
pub mod physics;
/// Platform abstraction layer
pub mod platform;
/// Rendering boundary and backends
pub mod render;
