//! Crawl orchestration
//!
//! The [`Crawler`] is the control plane of a run. It discovers how many items
//! the catalog currently has, walks the ids in ascending order and, for every
//! id not yet in the [`CatalogStore`], extracts the metadata, downloads the
//! artifact and persists the store before moving on.
//!
//! # State machine
//!
//! ```text
//! DiscoverBound -> Iterate(first) -> { skip | process } -> Iterate(i + 1) -> ... -> Done
//! ```
//!
//! Only a failed bound discovery ends a run early. Extraction failures leave
//! the id out of the store (it is retried on the next run); download failures
//! are recorded with `downloaded = false` and the id is not visited again.
//!
//! # Architecture
//!
//! - [`config`] - Run settings (storage root, id range)
//! - [`source`] - The catalog seam and its HTTP implementation
//! - [`progress`] - Events emitted to the console reporter
//! - [`stats`] - Per-run counters
//!
//! # Examples
//!
//! ```rust,no_run
//! use ebook_fetcher::app::{
//!     CatalogClient, CatalogStore, ClientConfig, CrawlConfig, Crawler, HttpCatalogSource,
//!     SilentReporter,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CatalogClient::new(&ClientConfig::default(), "http://it-ebooks.info")?;
//! let source = HttpCatalogSource::new(client, "filepi.com");
//! let store = CatalogStore::load("ebooks.json").await?;
//!
//! let mut crawler = Crawler::new(CrawlConfig::default(), source, store);
//! let stats = crawler.run(&mut SilentReporter).await?;
//! println!("{}", stats.summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod progress;
pub mod source;
pub mod stats;

#[cfg(test)]
mod tests;

use tracing::{debug, error, info, warn};

use crate::app::client::DownloadProgress;
use crate::app::models::ItemRecord;
use crate::app::store::CatalogStore;
use crate::errors::BoundDiscoveryError;

pub use config::CrawlConfig;
pub use progress::{CrawlEvent, CrawlReporter, SilentReporter};
pub use source::{CatalogSource, HttpCatalogSource};
pub use stats::{CrawlStats, ItemOutcome};

/// Controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrawlState {
    DiscoverBound,
    Iterate { id: u32, last_id: u32 },
    Done,
}

/// Single-threaded crawl controller owning the catalog store
pub struct Crawler<S> {
    config: CrawlConfig,
    source: S,
    store: CatalogStore,
}

impl<S: CatalogSource> Crawler<S> {
    pub fn new(config: CrawlConfig, source: S, store: CatalogStore) -> Self {
        Self {
            config,
            source,
            store,
        }
    }

    /// Run one full crawl
    ///
    /// # Errors
    ///
    /// Returns `BoundDiscoveryError` if the catalog's upper bound cannot be
    /// determined; nothing is extracted, downloaded or saved in that case.
    /// Every per-item failure is reported and absorbed.
    pub async fn run(
        &mut self,
        reporter: &mut dyn CrawlReporter,
    ) -> Result<CrawlStats, BoundDiscoveryError> {
        let mut stats = CrawlStats::default();
        let mut state = CrawlState::DiscoverBound;

        loop {
            state = match state {
                CrawlState::DiscoverBound => {
                    let max_id = match self.source.discover_max_id().await {
                        Ok(max_id) => max_id,
                        Err(e) => {
                            error!("Unable to discover latest item id: {}", e);
                            reporter.report(CrawlEvent::BoundFailed { error: &e });
                            return Err(e);
                        }
                    };
                    let last_id = self.config.last_id(max_id);
                    stats.max_id = max_id;
                    info!("Latest item id: #{} (visiting up to #{})", max_id, last_id);
                    reporter.report(CrawlEvent::BoundDiscovered { max_id, last_id });

                    CrawlState::Iterate {
                        id: self.config.first_id,
                        last_id,
                    }
                }
                CrawlState::Iterate { id, last_id } if id > last_id => CrawlState::Done,
                CrawlState::Iterate { id, last_id } => {
                    let outcome = self.visit(id, reporter).await;
                    stats.record(&outcome);

                    match id.checked_add(1) {
                        Some(next) => CrawlState::Iterate { id: next, last_id },
                        None => CrawlState::Done,
                    }
                }
                CrawlState::Done => break,
            };
        }

        stats.finish();
        info!("Crawl finished: {}", stats.summary());
        Ok(stats)
    }

    /// Skip or process a single id
    pub async fn visit(&mut self, id: u32, reporter: &mut dyn CrawlReporter) -> ItemOutcome {
        reporter.report(CrawlEvent::ItemStarted { id });

        if self.store.contains(id) {
            debug!("Item #{} already in store, skipping", id);
            reporter.report(CrawlEvent::ItemSkipped { id });
            return ItemOutcome::Skipped;
        }

        let mut record = match self.source.extract(id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Unable to parse item info: {}", e);
                reporter.report(CrawlEvent::ExtractFailed { error: &e });
                return ItemOutcome::ExtractFailed;
            }
        };

        let destination = record.local_path(&self.config.storage_root);
        if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
            warn!(
                "{} already exists; item #{} will overwrite it",
                destination.display(),
                id
            );
            reporter.report(CrawlEvent::OverwritingArtifact {
                record: &record,
                path: &destination,
            });
        }

        let bytes = self.fetch_artifact(&record, reporter).await;
        record.downloaded = bytes.is_some();

        if let Err(e) = self.store.insert(record) {
            // Unreachable while the controller is the store's only writer
            error!("Store rejected item #{}: {}", id, e);
            return ItemOutcome::Skipped;
        }
        if let Some(stored) = self.store.get(id) {
            reporter.report(CrawlEvent::ItemStored { record: stored });
        }

        let saved = self.persist(reporter).await;
        ItemOutcome::Stored { bytes, saved }
    }

    /// Re-attempt downloads of stored records whose artifact is missing
    ///
    /// Records are never re-extracted; a success flips `downloaded` and saves
    /// the store immediately.
    pub async fn retry_failed_downloads(&mut self, reporter: &mut dyn CrawlReporter) -> CrawlStats {
        let mut stats = CrawlStats::default();
        let pending: Vec<ItemRecord> = self.store.pending().cloned().collect();
        info!("Retrying {} pending downloads", pending.len());

        for record in pending {
            stats.ids_visited += 1;
            reporter.report(CrawlEvent::ItemStarted { id: record.id });

            match self.fetch_artifact(&record, reporter).await {
                Some(bytes) => {
                    self.store.set_downloaded(record.id, true);
                    stats.downloaded += 1;
                    stats.bytes_downloaded += bytes;
                    if let Some(stored) = self.store.get(record.id) {
                        reporter.report(CrawlEvent::ItemStored { record: stored });
                    }
                    if !self.persist(reporter).await {
                        stats.save_failed += 1;
                    }
                }
                None => stats.download_failed += 1,
            }
        }

        stats.finish();
        stats
    }

    /// Download the artifact of `record`; `Some(bytes)` on success
    async fn fetch_artifact(
        &mut self,
        record: &ItemRecord,
        reporter: &mut dyn CrawlReporter,
    ) -> Option<u64> {
        let destination = record.local_path(&self.config.storage_root);
        reporter.report(CrawlEvent::DownloadStarted { record });

        let id = record.id;
        let mut sink = |transferred: u64, total: Option<u64>| {
            reporter.report(CrawlEvent::Transfer {
                id,
                transferred,
                total,
            })
        };
        let progress: &mut dyn DownloadProgress = &mut sink;

        match self.source.download(record, &destination, progress).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Unable to download {}: {}", record.label(), e);
                reporter.report(CrawlEvent::DownloadFailed { record, error: &e });
                None
            }
        }
    }

    /// Save the store, reporting instead of propagating failures
    async fn persist(&mut self, reporter: &mut dyn CrawlReporter) -> bool {
        match self.store.save().await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save catalog snapshot: {}", e);
                reporter.report(CrawlEvent::SaveFailed { error: &e });
                false
            }
        }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_store(self) -> CatalogStore {
        self.store
    }
}
