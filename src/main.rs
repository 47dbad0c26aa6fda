//! Command-line trajectory analysis for pose-tracking projects.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ethotrace::app::AnalysisApp;
use ethotrace::config::{Config, EXAMPLE_CONFIG};
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short, long, default_value = "ethotrace.yaml")]
    config: String,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract rolling feature columns for every data file
    Features,

    /// Compute rolling velocities and the cross-video mean summary
    Velocity,

    /// Spontaneous-alternation analysis over the configured regions
    Alternations,

    /// Find coordinates the animal leaves and later returns to
    Loops,

    /// Render trajectory path plots
    PathPlot {
        /// Worker count for chunked rendering
        #[arg(long, default_value_t = num_cpus::get())]
        cores: usize,
    },

    /// Write an example configuration file and exit
    InitConfig {
        /// Where to write the file
        #[arg(long, default_value = "ethotrace.yaml")]
        path: String,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("ethotrace {}", env!("CARGO_PKG_VERSION"));

    if let Command::InitConfig { path } = &args.command {
        std::fs::write(path, EXAMPLE_CONFIG)?;
        info!("Wrote example configuration to {path}");
        return Ok(());
    }

    info!("Loading configuration from {}", args.config);
    let config = Config::from_file(&args.config)?;
    let app = AnalysisApp::new(config)?;

    match args.command {
        Command::Features => app.run_features()?,
        Command::Velocity => app.run_velocity()?,
        Command::Alternations => app.run_alternations()?,
        Command::Loops => app.run_loops()?,
        Command::PathPlot { cores } => app.run_path_plots(cores)?,
        // handled above
        Command::InitConfig { .. } => {}
    }

    Ok(())
}
