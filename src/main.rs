//! Pledgewatch main entry point
//!
//! Command-line interface dispatching to one of the four crawl modes.

use clap::{Parser, ValueEnum};
use pledgewatch::config::load_config_with_hash;
use pledgewatch::crawler::{Coordinator, RunMode};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Pledgewatch: incremental crowdfunding crawler
///
/// Crawls the platform's discovery feed and project pages, reconciling every
/// sighting into a local store that tracks each project's funding trajectory
/// over time.
#[derive(Parser, Debug)]
#[command(name = "pledgewatch")]
#[command(version)]
#[command(about = "Incremental crowdfunding crawl-and-reconcile pipeline", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Which crawl to run
    #[arg(value_enum, value_name = "MODE")]
    mode: Mode,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// CLI spelling of the run modes
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Exhaustive sweep over every configured filter combination (hours)
    FullScan,

    /// Scan the newest live projects
    Newest,

    /// Re-fetch all live projects currently in the store
    RefreshLive,

    /// Scrape missing creator profile data
    EnrichCreators,
}

impl From<Mode> for RunMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::FullScan => RunMode::FullScan,
            Mode::Newest => RunMode::NewestLive,
            Mode::RefreshLive => RunMode::RefreshLive,
            Mode::EnrichCreators => RunMode::EnrichCreators,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // A store that cannot be opened is fatal before any crawling starts
    let mut coordinator = match Coordinator::new(config, config_hash) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            tracing::error!("Failed to initialize: {}", e);
            return Err(e.into());
        }
    };

    match coordinator.run(cli.mode.into()).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the tracing subscriber based on verbosity level
///
/// With `--log-file` the subscriber writes to that file (creating its parent
/// directory if needed); otherwise it logs to stderr.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> std::io::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pledgewatch=info,warn"),
            1 => EnvFilter::new("pledgewatch=debug,info"),
            2 => EnvFilter::new("pledgewatch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::sync::Arc::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .init();
        }
    }

    Ok(())
}
