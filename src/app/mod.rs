//! Core application logic for the e-book fetcher
//!
//! This module contains the catalog HTTP client, page scraping, the catalog
//! store and the crawl controller that ties them together.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ebook_fetcher::app::{CatalogClient, ClientConfig, MetadataExtractor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CatalogClient::new(&ClientConfig::default(), "http://it-ebooks.info")?;
//! let extractor = MetadataExtractor::new(client, "filepi.com");
//!
//! let latest = extractor.discover_max_id().await?;
//! let record = extractor.extract(latest).await?;
//! println!("#{} {} -> {}", record.id, record.title, record.save_path);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod coordinator;
pub mod extract;
pub mod models;
pub mod path;
pub mod store;

// Re-export main public API
pub use client::{CatalogClient, ClientConfig, DownloadProgress};
pub use coordinator::{
    CatalogSource, CrawlConfig, CrawlEvent, CrawlReporter, CrawlStats, Crawler,
    HttpCatalogSource, ItemOutcome, SilentReporter,
};
pub use extract::{parse_item_page, parse_latest_id, MetadataExtractor};
pub use models::{ItemMetadata, ItemRecord};
pub use path::sanitize_segment;
pub use store::{CatalogStore, StoreSummary};
