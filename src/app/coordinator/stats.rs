//! Crawl statistics tracking
//!
//! Counts what happened to every id the controller visited during one run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to a single catalog id
#[derive(Debug)]
pub enum ItemOutcome {
    /// Id already present in the store
    Skipped,
    /// Metadata could not be extracted; the id stays absent
    ExtractFailed,
    /// Record inserted; `bytes` is `Some` when the artifact was downloaded
    Stored { bytes: Option<u64>, saved: bool },
}

/// Aggregated statistics of one crawl or retry session
#[derive(Debug, Clone, Serialize)]
pub struct CrawlStats {
    /// Highest catalog id discovered at the start of the run
    pub max_id: u32,
    /// Ids visited
    pub ids_visited: usize,
    /// Ids skipped because they were already stored
    pub skipped: usize,
    /// Ids whose extraction failed
    pub extract_failed: usize,
    /// Records inserted into the store
    pub stored: usize,
    /// Artifacts downloaded successfully
    pub downloaded: usize,
    /// Artifacts whose download failed
    pub download_failed: usize,
    /// Snapshot saves that failed
    pub save_failed: usize,
    /// Total artifact bytes written
    pub bytes_downloaded: u64,
    /// Start time of the session
    pub session_start: DateTime<Utc>,
    /// Session duration, set when the session finishes
    pub session_duration: Duration,
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self {
            max_id: 0,
            ids_visited: 0,
            skipped: 0,
            extract_failed: 0,
            stored: 0,
            downloaded: 0,
            download_failed: 0,
            save_failed: 0,
            bytes_downloaded: 0,
            session_start: Utc::now(),
            session_duration: Duration::ZERO,
        }
    }
}

impl CrawlStats {
    /// Account for the outcome of one id
    pub fn record(&mut self, outcome: &ItemOutcome) {
        self.ids_visited += 1;
        match outcome {
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::ExtractFailed => self.extract_failed += 1,
            ItemOutcome::Stored { bytes, saved } => {
                self.stored += 1;
                match bytes {
                    Some(bytes) => {
                        self.downloaded += 1;
                        self.bytes_downloaded += bytes;
                    }
                    None => self.download_failed += 1,
                }
                if !saved {
                    self.save_failed += 1;
                }
            }
        }
    }

    /// Ids that required network work this run
    pub fn processed(&self) -> usize {
        self.ids_visited - self.skipped
    }

    /// Update session duration from start time
    pub fn finish(&mut self) {
        self.session_duration = Utc::now()
            .signed_duration_since(self.session_start)
            .to_std()
            .unwrap_or(Duration::ZERO);
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        format!(
            "{} ids visited: {} skipped, {} new ({} downloaded, {} download failures), {} extraction failures",
            self.ids_visited,
            self.skipped,
            self.stored,
            self.downloaded,
            self.download_failed,
            self.extract_failed
        )
    }
}
