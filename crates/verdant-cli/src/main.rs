mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "verdant", about = "Seasonal NDVI and land-surface-temperature composites from Landsat scenes")]
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
    /// List catalog scenes matching a bounding box, date range and cloud cover
    Search(commands::search::SearchArgs),
    /// Build seasonal composites and write them to disk
    Composite(commands::composite::CompositeArgs),
    /// Print or save the default pipeline config as TOML
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
        Commands::Search(args) => commands::search::run(args),
        Commands::Composite(args) => commands::composite::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
