mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beamfind", about = "Beam center finding for diffraction frame stacks")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show frame stack metadata
    Info(commands::info::InfoArgs),
    /// Find centers for the sampled frames of a stack
    Run(commands::run::RunArgs),
    /// Find the center of a single frame
    Frame(commands::frame::FrameArgs),
    /// Print or save the default run configuration
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Run(args) => commands::run::run(args, cli.verbose),
        Commands::Frame(args) => commands::frame::run(args, cli.verbose),
        Commands::Config(args) => commands::config::run(args),
    }
}
