//! coursekit CLI entry point.
//!
//! # Responsibility
//! - Resolve configuration layers and bootstrap logging and storage.
//! - Dispatch catalog, notes, items and config subcommands to core services.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coursekit_core::{AppConfig, LogSettings};
use log::info;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "coursekit",
    author,
    version,
    about = "Product catalog, persisted notes and a synchronized item list"
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides config and environment)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Base URL of the remote item collection
    #[arg(long = "api-base-url", global = true, value_name = "URL")]
    api_base_url: Option<String>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long = "log-level", global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// In-memory product catalog operations
    Catalog(commands::CatalogArgs),
    /// Persisted notes list
    Notes(commands::NotesArgs),
    /// Local item list synchronized with the remote collection
    Items(commands::ItemsArgs),
    /// Inspect the resolved configuration
    Config(commands::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let log_settings = LogSettings::from_config(&config, &cwd)?;
    coursekit_core::init_logging(&log_settings).context("failed to initialize logging")?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        coursekit_core::core_version()
    );

    let result = match cli.command {
        Commands::Catalog(args) => commands::run_catalog(args),
        Commands::Notes(args) => commands::run_notes(args, &config),
        Commands::Items(args) => commands::run_items(args, &config),
        Commands::Config(args) => commands::run_config(args, &config),
    };
    coursekit_core::flush_logs();
    result
}

/// Applies CLI flags over file and environment layers.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(url) = &cli.api_base_url {
        config.api.base_url = url.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}
