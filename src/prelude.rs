//! Prelude module for the e-book fetcher library
//!
//! Re-exports the items needed for a typical crawl with a single
//! `use ebook_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ebook_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let client = CatalogClient::new(&config.client.to_runtime_config(), &config.catalog.base_url)?;
//!     let source = HttpCatalogSource::new(client, config.catalog.artifact_host_pattern.clone());
//!     let store = CatalogStore::load(&config.storage.snapshot_path).await?;
//!
//!     let mut crawler = Crawler::new(config.crawl_config(), source, store);
//!     crawler.run(&mut SilentReporter).await?;
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

pub use crate::app::{
    CatalogClient, CatalogSource, CatalogStore, ClientConfig, CrawlConfig, CrawlEvent,
    CrawlReporter, CrawlStats, Crawler, HttpCatalogSource, ItemRecord, MetadataExtractor,
    SilentReporter,
};

pub use crate::config::AppConfig;

pub use crate::constants::{ARTIFACT_HOST_PATTERN, CATALOG_BASE_URL, SNAPSHOT_FILE_NAME};

pub use std::path::{Path, PathBuf};

pub use tokio;
