//! Console progress display for crawl operations
//!
//! [`ConsoleReporter`] turns [`CrawlEvent`]s into indicatif progress bars
//! when stderr is a terminal, and into plain log lines otherwise.
//!
//! # Examples
//!
//! ```rust
//! use ebook_fetcher::cli::progress::{format_bytes, format_progress};
//!
//! assert_eq!(format_bytes(1536), "1.50KB");
//! assert_eq!(format_progress(512, Some(1024)), "512.00B/1024.00B [50.00%]");
//! assert_eq!(format_progress(2048, None), "2.00KB/?");
//! ```

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::app::{CrawlEvent, CrawlReporter, ItemRecord};
use crate::constants::progress::{SIZE_UNITS, SPINNER_TICK_MS};

const BAR_TEMPLATE: &str =
    "{prefix} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, ETA: {eta})";
const SPINNER_TEMPLATE: &str = "{prefix} {spinner:.green} {msg} {bytes} ({bytes_per_sec})";

/// Render a byte count with 1024-based units and two decimals
pub fn format_bytes(len: u64) -> String {
    let mut size = len as f64;
    let mut unit = 0;
    while size > 1024.0 && unit + 1 < SIZE_UNITS.len() {
        unit += 1;
        size /= 1024.0;
    }
    format!("{:.2}{}", size, SIZE_UNITS[unit])
}

/// Render transferred bytes against the declared total
pub fn format_progress(transferred: u64, total: Option<u64>) -> String {
    match total {
        Some(total) => {
            let percent = if total == 0 {
                100.0
            } else {
                transferred as f64 * 100.0 / total as f64
            };
            format!(
                "{}/{} [{:.2}%]",
                format_bytes(transferred),
                format_bytes(total),
                percent
            )
        }
        None => format!("{}/?", format_bytes(transferred)),
    }
}

/// Crawl reporter writing to the terminal
pub struct ConsoleReporter {
    enabled: bool,
    interactive: bool,
    last_id: Option<u32>,
    current_id: u32,
    bar: Option<ProgressBar>,
    sized: bool,
    transferred: u64,
    total: Option<u64>,
}

impl ConsoleReporter {
    /// Create a reporter; progress bars are only drawn on a terminal
    pub fn new(enabled: bool) -> Self {
        let interactive = atty::is(atty::Stream::Stderr);
        Self::with_terminal(enabled, interactive)
    }

    pub fn with_terminal(enabled: bool, interactive: bool) -> Self {
        Self {
            enabled,
            interactive,
            last_id: None,
            current_id: 0,
            bar: None,
            sized: false,
            transferred: 0,
            total: None,
        }
    }

    fn prefix(&self) -> String {
        match self.last_id {
            Some(last_id) => format!("[{}/{}]", self.current_id, last_id),
            None => format!("[{}]", self.current_id),
        }
    }

    /// Print above any active bar
    fn line(&self, message: String) {
        match &self.bar {
            Some(bar) => bar.println(message),
            None => eprintln!("{}", message),
        }
    }

    fn start_bar(&mut self, record: &ItemRecord) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix(self.prefix());
        bar.set_message(record.label());
        bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
        self.bar = Some(bar);
        self.sized = false;
    }

    fn update_bar(&mut self, transferred: u64, total: Option<u64>) {
        let Some(bar) = &self.bar else {
            return;
        };
        if let (Some(total), false) = (total, self.sized) {
            bar.disable_steady_tick();
            bar.set_length(total);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("##-"),
            );
            self.sized = true;
        }
        bar.set_position(transferred);
    }

    fn clear_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl CrawlReporter for ConsoleReporter {
    fn report(&mut self, event: CrawlEvent<'_>) {
        if !self.enabled {
            return;
        }

        match event {
            CrawlEvent::BoundDiscovered { max_id, last_id } => {
                self.last_id = Some(last_id);
                if last_id < max_id {
                    eprintln!("Latest item id: #{} (stopping at #{})", max_id, last_id);
                } else {
                    eprintln!("Latest item id: #{}", max_id);
                }
            }
            CrawlEvent::BoundFailed { error } => {
                eprintln!("Unable to discover latest item id: {}", error);
            }
            CrawlEvent::ItemStarted { id } => {
                self.current_id = id;
            }
            CrawlEvent::ItemSkipped { .. } => {}
            CrawlEvent::ExtractFailed { error } => {
                self.line(format!("Unable to parse item info: {}", error));
            }
            CrawlEvent::OverwritingArtifact { record, path } => {
                self.line(format!(
                    "Warning: {} replaces existing file {}",
                    record.label(),
                    path.display()
                ));
            }
            CrawlEvent::DownloadStarted { record } => {
                self.transferred = 0;
                self.total = None;
                if self.interactive {
                    self.start_bar(record);
                } else {
                    eprintln!("{} Downloading {}", self.prefix(), record.label());
                }
            }
            CrawlEvent::Transfer {
                transferred, total, ..
            } => {
                self.transferred = transferred;
                self.total = total;
                self.update_bar(transferred, total);
            }
            CrawlEvent::DownloadFailed { record, error } => {
                self.clear_bar();
                eprintln!("Unable to download {}: {}", record.label(), error);
            }
            CrawlEvent::ItemStored { record } => {
                self.clear_bar();
                if record.downloaded {
                    eprintln!(
                        "{} Saved {} {}",
                        self.prefix(),
                        record.label(),
                        format_progress(self.transferred, self.total)
                    );
                }
            }
            CrawlEvent::SaveFailed { error } => {
                self.line(format!("Failed to save catalog snapshot: {}", error));
            }
        }
    }
}

impl Drop for ConsoleReporter {
    fn drop(&mut self) {
        self.clear_bar();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::sample_metadata;
    use crate::errors::{DownloadError, ExtractError};

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0.00B");
        assert_eq!(format_bytes(1000), "1000.00B");
        // Boundary is exclusive
        assert_eq!(format_bytes(1024), "1024.00B");
        assert_eq!(format_bytes(1536), "1.50KB");
        assert_eq!(format_bytes(5 * 1024 * 1024 + 512 * 1024), "5.50MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024 + 1), "3.00GB");
    }

    #[test]
    fn test_format_bytes_caps_at_largest_unit() {
        let huge = 1024u64.pow(4) * 2048;
        assert_eq!(format_bytes(huge), "2048.00TB");
    }

    #[test]
    fn test_format_progress() {
        assert_eq!(
            format_progress(1536, Some(3072)),
            "1.50KB/3.00KB [50.00%]"
        );
        assert_eq!(format_progress(10, Some(10)), "10.00B/10.00B [100.00%]");
        assert_eq!(format_progress(0, Some(0)), "0.00B/0.00B [100.00%]");
        assert_eq!(format_progress(2048, None), "2.00KB/?");
    }

    #[test]
    fn test_reporter_tracks_transfer() {
        let mut reporter = ConsoleReporter::with_terminal(true, false);
        let record = ItemRecord::new(
            7,
            "http://it-ebooks.info/book/7/",
            sample_metadata("Learning Rust"),
        );

        reporter.report(CrawlEvent::BoundDiscovered {
            max_id: 10,
            last_id: 10,
        });
        reporter.report(CrawlEvent::ItemStarted { id: 7 });
        assert_eq!(reporter.prefix(), "[7/10]");

        let existing = std::path::PathBuf::from("OReilly Media/Learning Rust/Learning Rust.pdf");
        reporter.report(CrawlEvent::OverwritingArtifact {
            record: &record,
            path: &existing,
        });
        reporter.report(CrawlEvent::DownloadStarted { record: &record });
        reporter.report(CrawlEvent::Transfer {
            id: 7,
            transferred: 4096,
            total: Some(8192),
        });
        assert_eq!(reporter.transferred, 4096);
        assert_eq!(reporter.total, Some(8192));
        assert!(reporter.bar.is_none());

        let error = DownloadError::NotFound {
            url: record.download_url.clone(),
        };
        reporter.report(CrawlEvent::DownloadFailed {
            record: &record,
            error: &error,
        });
        reporter.report(CrawlEvent::ItemStored { record: &record });
    }

    #[test]
    fn test_disabled_reporter_ignores_events() {
        let mut reporter = ConsoleReporter::with_terminal(false, true);
        let error = ExtractError::NoDownloadLink { id: 3 };

        reporter.report(CrawlEvent::BoundDiscovered {
            max_id: 5,
            last_id: 5,
        });
        reporter.report(CrawlEvent::ExtractFailed { error: &error });
        assert_eq!(reporter.last_id, None);
        assert!(reporter.bar.is_none());
    }

    #[test]
    fn test_interactive_bar_lifecycle() {
        let mut reporter = ConsoleReporter::with_terminal(true, true);
        let mut record = ItemRecord::new(
            2,
            "http://it-ebooks.info/book/2/",
            sample_metadata("Programming Rust"),
        );

        reporter.report(CrawlEvent::ItemStarted { id: 2 });
        reporter.report(CrawlEvent::DownloadStarted { record: &record });
        assert!(reporter.bar.is_some());

        reporter.report(CrawlEvent::Transfer {
            id: 2,
            transferred: 100,
            total: Some(200),
        });
        assert!(reporter.sized);

        record.downloaded = true;
        reporter.report(CrawlEvent::ItemStored { record: &record });
        assert!(reporter.bar.is_none());
    }
}
