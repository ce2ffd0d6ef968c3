//! avsync CLI - command-line interface for the mileage-car catalog
//!
//! Provides commands for:
//! - Running a crawl pass against av.by
//! - Managing the (brand, model) crawl catalog
//! - Inspecting and bootstrapping the configuration file

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{catalog::CatalogCommand, config::ConfigCommand, sync::SyncCommand};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "avsync",
    version,
    about = "Mileage-car catalog fed from av.by sold listings"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one crawl pass over the catalog
    Sync(SyncCommand),
    /// Manage the (brand, model) crawl catalog
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing; RUST_LOG wins over the -v / -q flags when set
    let filter = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(config_path, format).await,
        Commands::Catalog(cmd) => cmd.execute(config_path, format).await,
        Commands::Config(cmd) => cmd.execute(config_path, format).await,
    }
}
