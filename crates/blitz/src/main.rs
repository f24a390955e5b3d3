//! Blitz CLI - Batch resize, watermark, sign and re-encode images.
//!
//! Blitz takes a file or a directory of JPEG, PNG and WebP images, runs each
//! one through the transform pipeline in its own worker, and writes the
//! results plus a JSON report.
//!
//! # Usage
//!
//! ```bash
//! # Halve a directory of photos and stamp a watermark
//! blitz process ./photos --resize-percent 50 --watermark-text "© Me"
//!
//! # Convert to WebP with a signature, streaming a JSONL report
//! blitz process ./photos --to webp --signature sig.png --format jsonl
//!
//! # View configuration
//! blitz config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Blitz - Batch image transforms from the command line.
#[derive(Parser, Debug)]
#[command(name = "blitz")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Resize, watermark, sign and re-encode images
    Process(cli::process::ProcessArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match blitz_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `blitz config path`."
            );
            blitz_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Blitz v{}", blitz_core::VERSION);

    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
