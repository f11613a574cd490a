//! Crawl progress events
//!
//! The controller reports everything user-visible through a [`CrawlReporter`];
//! rendering is left to the implementor (the CLI draws progress bars, tests
//! record the events).

use std::path::Path;

use crate::app::models::ItemRecord;
use crate::errors::{BoundDiscoveryError, DownloadError, ExtractError, StoreError};

/// Something the controller did or observed
#[derive(Debug)]
pub enum CrawlEvent<'a> {
    /// Upper bound discovered
    BoundDiscovered { max_id: u32, last_id: u32 },
    /// Upper bound could not be discovered; the run stops
    BoundFailed { error: &'a BoundDiscoveryError },
    /// Id is about to be visited
    ItemStarted { id: u32 },
    /// Id already stored
    ItemSkipped { id: u32 },
    /// Extraction failed for an id
    ExtractFailed { error: &'a ExtractError },
    /// A new item's artifact path already holds a file, which will be replaced
    OverwritingArtifact {
        record: &'a ItemRecord,
        path: &'a Path,
    },
    /// Artifact transfer is starting
    DownloadStarted { record: &'a ItemRecord },
    /// Bytes transferred so far for the current artifact
    Transfer {
        id: u32,
        transferred: u64,
        total: Option<u64>,
    },
    /// Artifact transfer failed
    DownloadFailed {
        record: &'a ItemRecord,
        error: &'a DownloadError,
    },
    /// Record inserted into the store
    ItemStored { record: &'a ItemRecord },
    /// Snapshot could not be written
    SaveFailed { error: &'a StoreError },
}

/// Sink for crawl events
pub trait CrawlReporter {
    fn report(&mut self, event: CrawlEvent<'_>);
}

/// Reporter that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl CrawlReporter for SilentReporter {
    fn report(&mut self, _event: CrawlEvent<'_>) {}
}
