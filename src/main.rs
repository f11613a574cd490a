//! E-book Fetcher CLI application
//!
//! Command-line interface for incrementally mirroring an online e-book
//! catalog into a local directory tree.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ebook_fetcher::cli::{
    handle_config, handle_crawl, handle_list, handle_retry, handle_status, Cli, Commands,
};
use ebook_fetcher::config::AppConfig;
use ebook_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // Config errors surface again from the command handler
    let configured_level = AppConfig::load(cli.global.config.clone())
        .await
        .ok()
        .map(|config| config.logging.level);
    init_logging(&cli, configured_level.as_deref());

    info!("E-book Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Crawl(args) => {
            info!("Executing crawl command");
            handle_crawl(&cli.global, args).await
        }
        Commands::Status(args) => handle_status(&cli.global, args).await,
        Commands::List(args) => handle_list(&cli.global, args).await,
        Commands::RetryFailed(args) => {
            info!("Executing retry-failed command");
            handle_retry(&cli.global, args).await
        }
        Commands::Config(args) => handle_config(&cli.global, args).await,
    }
}

/// Initialize logging from CLI verbosity flags or the configured level
fn init_logging(cli: &Cli, configured_level: Option<&str>) {
    let log_level = cli.log_level_with(configured_level);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("ebook_fetcher={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
