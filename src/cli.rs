//! 命令行

use crate::config::DemoConfig;
use crate::core::error::DemoResult;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "demo_suite")]
#[command(about = "Classic windowing and graphics demos", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Demo to run
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (TOML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Particle fountain
    Particles {
        /// Run in fullscreen
        #[arg(short, long)]
        fullscreen: bool,

        /// Step physics on the render thread
        #[arg(short = 's', long)]
        single_threaded: bool,
    },

    /// Bouncing Amiga ball
    Boing {
        /// Run in fullscreen
        #[arg(short, long)]
        fullscreen: bool,
    },

    /// Pressure wave grid
    Wave {
        /// Run in fullscreen
        #[arg(short, long)]
        fullscreen: bool,
    },

    /// Three meshing gears
    Gears {
        /// Run in fullscreen
        #[arg(short, long)]
        fullscreen: bool,
    },

    /// Height map grown from random circles
    Heightmap {
        /// Seed for the terrain generator
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Torus seen through four viewports
    Splitview,

    /// Rotating triangle
    Simple,
}

impl Cli {
    /// 读取配置：`--config` 指定的文件必须可用，否则自动查找；再叠加环境变量和命令行开关
    pub fn load_config(&self) -> DemoResult<DemoConfig> {
        let mut config = match &self.config {
            Some(path) => DemoConfig::from_file(path)?,
            None => DemoConfig::load_or_default(),
        };
        config.apply_env_overrides();
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// 命令行开关覆盖配置
    pub fn apply_to(&self, config: &mut DemoConfig) {
        match self.command {
            Commands::Particles {
                fullscreen,
                single_threaded,
            } => {
                config.window.fullscreen |= fullscreen;
                if single_threaded {
                    config.particles.multithreaded = false;
                }
            }
            Commands::Boing { fullscreen }
            | Commands::Wave { fullscreen }
            | Commands::Gears { fullscreen } => {
                config.window.fullscreen |= fullscreen;
            }
            Commands::Heightmap { seed } => {
                if seed.is_some() {
                    config.heightmap.seed = seed;
                }
            }
            Commands::Splitview | Commands::Simple => {}
        }
    }
}
