//! Command-line argument parsing for the e-book fetcher
//!
//! This module defines the CLI structure using clap derive macros: the
//! crawl itself, snapshot inspection, download retries and config handling.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// E-book Fetcher - mirror a numbered online e-book catalog
#[derive(Parser, Debug)]
#[command(
    name = "ebook_fetcher",
    version,
    about = "Incrementally mirror an online e-book catalog",
    long_about = "Walks every item of a numerically indexed e-book catalog, scrapes its metadata,
downloads the file and records everything in a JSON snapshot so that later runs resume
where the previous one stopped."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl the catalog, downloading every item not yet in the snapshot
    Crawl(CrawlArgs),

    /// Show totals from the snapshot
    Status(StatusArgs),

    /// List stored items
    List(ListArgs),

    /// Re-attempt downloads of items whose artifact is missing
    RetryFailed(RetryArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the crawl command
#[derive(Args, Debug, Clone, Default)]
pub struct CrawlArgs {
    /// Snapshot file (overrides the configured path)
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Directory artifacts are saved under
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Catalog base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Stop after this id even if the catalog has more
    #[arg(long, value_name = "ID")]
    pub up_to: Option<u32>,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the status command
#[derive(Args, Debug, Clone, Default)]
pub struct StatusArgs {
    /// Snapshot file (overrides the configured path)
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,
}

/// Arguments for the list command
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Snapshot file (overrides the configured path)
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Only list items whose artifact has not been downloaded
    #[arg(short, long)]
    pub pending: bool,
}

/// Arguments for the retry-failed command
#[derive(Args, Debug, Clone, Default)]
pub struct RetryArgs {
    /// Snapshot file (overrides the configured path)
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Directory artifacts are saved under
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Target file (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        self.global.log_level()
    }

    /// Get the log level, falling back to `configured` when no flag is set
    pub fn log_level_with(&self, configured: Option<&str>) -> tracing::Level {
        self.global.log_level_with(configured)
    }
}

impl GlobalArgs {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        self.log_level_with(None)
    }

    /// Get the log level, preferring verbosity flags over `configured`
    ///
    /// `configured` is the `[logging] level` from the config file; an
    /// unparseable value falls back to WARN.
    pub fn log_level_with(&self, configured: Option<&str>) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.very_verbose {
            tracing::Level::DEBUG
        } else if self.verbose {
            tracing::Level::INFO
        } else {
            configured
                .and_then(|level| level.parse().ok())
                .unwrap_or(tracing::Level::WARN)
        }
    }

    /// Whether progress output should be drawn at all
    pub fn show_progress(&self, no_progress: bool) -> bool {
        !self.quiet && !no_progress
    }
}

impl CrawlArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.up_to == Some(0) {
            return Err("--up-to must be at least 1".to_string());
        }
        Ok(())
    }
}
