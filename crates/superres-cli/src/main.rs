mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "superres", about = "Multi-frame MAP super-resolution")]
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
    /// Degrade an HR image into synthetic LR frames
    Simulate(commands::simulate::SimulateArgs),
    /// Shift-and-add fusion of LR frames
    Fuse(commands::fuse::FuseArgs),
    /// MAP-IRLS reconstruction of LR frames
    Solve(commands::solve::SolveArgs),
    /// Print or save a default reconstruction config
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
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Fuse(args) => commands::fuse::run(args),
        Commands::Solve(args) => commands::solve::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
