//! Command-line interface components
//!
//! This module contains CLI-specific code for the e-book fetcher, including
//! argument parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, CrawlArgs, GlobalArgs, ListArgs, RetryArgs,
    StatusArgs,
};
pub use commands::{handle_config, handle_crawl, handle_list, handle_retry, handle_status};
pub use progress::{format_bytes, format_progress, ConsoleReporter};
