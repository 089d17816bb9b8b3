use clap::Parser;
use demo_suite::cli::{Cli, Commands};
use demo_suite::core::{init_logging, run_demo, DemoResult};
use demo_suite::demos::{
    BoingDemo, GearsDemo, HeightMapDemo, ParticlesDemo, SimpleDemo, SplitViewDemo, WaveDemo,
};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!(target: "app", "{}", e);
        eprintln!("demo_suite failed: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> DemoResult<()> {
    let config = cli.load_config()?;
    init_logging(&config.logging, cli.verbose);

    match cli.command {
        Commands::Particles { .. } => {
            run_demo(ParticlesDemo::new(&config.particles)?, &config.window)
        }
        Commands::Boing { .. } => run_demo(
            BoingDemo::new(&config.boing),
            &BoingDemo::window_config(&config.window),
        ),
        Commands::Wave { .. } => run_demo(WaveDemo::new(&config.wave), &config.window),
        Commands::Gears { .. } => {
            run_demo(GearsDemo::new(), &GearsDemo::window_config(&config.window))
        }
        Commands::Heightmap { .. } => run_demo(
            HeightMapDemo::new(&config.heightmap),
            &HeightMapDemo::window_config(&config.window),
        ),
        Commands::Splitview => run_demo(
            SplitViewDemo::new(),
            &SplitViewDemo::window_config(&config.window),
        ),
        Commands::Simple => run_demo(SimpleDemo::new(), &config.window),
    }
}
