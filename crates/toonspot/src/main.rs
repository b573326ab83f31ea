//! Toonspot CLI - detect animated characters in images with CLIP.
//!
//! # Usage
//!
//! ```bash
//! # Fetch the CLIP model
//! toonspot models download
//!
//! # Start the upload page on http://127.0.0.1:8501
//! toonspot serve
//!
//! # Classify files or directories from the terminal
//! toonspot classify ./screenshots --threshold 0.6
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod server;

/// Toonspot - Upload an image, and Toonspot will detect animated characters.
#[derive(Parser, Debug)]
#[command(name = "toonspot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, env = "TOONSPOT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the upload page and JSON API
    Serve(cli::serve::ServeArgs),

    /// Classify image files or directories
    Classify(cli::classify::ClassifyArgs),

    /// Print the character labels
    Labels,

    /// Manage the CLIP model (download, list, path)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match &cli.config {
        Some(path) => toonspot_core::Config::load_from(path)?,
        None => match toonspot_core::Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `toonspot config path`."
                );
                toonspot_core::Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Toonspot v{}", toonspot_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Classify(args) => cli::classify::execute(args, config).await,
        Commands::Labels => cli::labels::execute(),
        Commands::Models(args) => cli::models::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config, cli.config.as_deref()),
    }
}
