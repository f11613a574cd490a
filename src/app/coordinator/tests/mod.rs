//! Crawl controller tests against an in-memory catalog

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::*;
use crate::app::client::DownloadProgress;
use crate::app::models::{sample_metadata, ItemRecord};
use crate::app::store::CatalogStore;
use crate::errors::{DownloadError, DownloadResult, ExtractError, ExtractResult};

const ARTIFACT: &[u8] = b"%PDF-1.4 fake artifact body";

/// Catalog with scripted pages and download results
#[derive(Default)]
struct FakeCatalog {
    max_id: Option<u32>,
    missing: HashSet<u32>,
    failing_downloads: HashSet<u32>,
    extract_calls: Vec<u32>,
    download_calls: Vec<u32>,
}

impl FakeCatalog {
    fn with_max_id(max_id: u32) -> Self {
        Self {
            max_id: Some(max_id),
            ..Default::default()
        }
    }

    fn missing(mut self, ids: &[u32]) -> Self {
        self.missing.extend(ids);
        self
    }

    fn failing_downloads(mut self, ids: &[u32]) -> Self {
        self.failing_downloads.extend(ids);
        self
    }
}

fn record_for(id: u32) -> ItemRecord {
    ItemRecord::new(
        id,
        format!("http://catalog.test/book/{}/", id),
        sample_metadata(&format!("Book {}", id)),
    )
}

impl CatalogSource for FakeCatalog {
    async fn discover_max_id(&mut self) -> Result<u32, BoundDiscoveryError> {
        self.max_id.ok_or(BoundDiscoveryError::AnchorNotFound {
            selector: "td[width='120'] a".to_string(),
        })
    }

    async fn extract(&mut self, id: u32) -> ExtractResult<ItemRecord> {
        self.extract_calls.push(id);
        if self.missing.contains(&id) {
            return Err(ExtractError::MissingField { id, field: "title" });
        }
        Ok(record_for(id))
    }

    async fn download(
        &mut self,
        record: &ItemRecord,
        destination: &Path,
        progress: &mut dyn DownloadProgress,
    ) -> DownloadResult<u64> {
        self.download_calls.push(record.id);
        if self.failing_downloads.contains(&record.id) {
            return Err(DownloadError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, ARTIFACT).await?;

        let total = ARTIFACT.len() as u64;
        progress.on_progress(total / 2, Some(total));
        progress.on_progress(total, Some(total));
        Ok(total)
    }
}

/// Reporter that keeps a compact trace of events
#[derive(Default)]
struct RecordingReporter {
    events: Vec<String>,
}

impl CrawlReporter for RecordingReporter {
    fn report(&mut self, event: CrawlEvent<'_>) {
        let line = match event {
            CrawlEvent::BoundDiscovered { max_id, last_id } => format!("bound {} {}", max_id, last_id),
            CrawlEvent::BoundFailed { .. } => "bound-failed".to_string(),
            CrawlEvent::ItemStarted { id } => format!("start {}", id),
            CrawlEvent::ItemSkipped { id } => format!("skip {}", id),
            CrawlEvent::ExtractFailed { error } => format!("extract-failed {:?}", error.id()),
            CrawlEvent::OverwritingArtifact { record, .. } => format!("overwrite {}", record.id),
            CrawlEvent::DownloadStarted { record } => format!("download {}", record.id),
            CrawlEvent::Transfer { id, transferred, .. } => format!("transfer {} {}", id, transferred),
            CrawlEvent::DownloadFailed { record, .. } => format!("download-failed {}", record.id),
            CrawlEvent::ItemStored { record } => {
                format!("stored {} {}", record.id, record.downloaded)
            }
            CrawlEvent::SaveFailed { .. } => "save-failed".to_string(),
        };
        self.events.push(line);
    }
}

struct Fixture {
    _temp_dir: TempDir,
    snapshot: PathBuf,
    storage_root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let snapshot = temp_dir.path().join("ebooks.json");
        let storage_root = temp_dir.path().join("books");
        Self {
            _temp_dir: temp_dir,
            snapshot,
            storage_root,
        }
    }

    fn config(&self) -> CrawlConfig {
        CrawlConfig::default().with_storage_root(&self.storage_root)
    }

    async fn crawler(&self, catalog: FakeCatalog) -> Crawler<FakeCatalog> {
        let store = CatalogStore::load(&self.snapshot).await.unwrap();
        Crawler::new(self.config(), catalog, store)
    }
}

fn stored_ids(store: &CatalogStore) -> Vec<u32> {
    store.iter().map(|record| record.id).collect()
}

#[tokio::test]
async fn test_mixed_run_then_rerun_retries_only_failed_extraction() {
    let fixture = Fixture::new();

    let mut crawler = fixture
        .crawler(FakeCatalog::with_max_id(3).missing(&[2]))
        .await;
    let stats = crawler.run(&mut SilentReporter).await.unwrap();

    assert_eq!(stats.max_id, 3);
    assert_eq!(stats.stored, 2);
    assert_eq!(stats.extract_failed, 1);
    assert_eq!(crawler.source().extract_calls, vec![1, 2, 3]);
    assert_eq!(stored_ids(crawler.store()), vec![1, 3]);
    assert!(crawler.store().iter().all(|record| record.downloaded));

    // Artifacts are on disk where the records say
    for record in crawler.store().iter() {
        let path = record.local_path(&fixture.storage_root);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), ARTIFACT);
    }

    // Snapshot on disk matches memory
    let reloaded = CatalogStore::load(&fixture.snapshot).await.unwrap();
    assert_eq!(stored_ids(&reloaded), vec![1, 3]);
    let first_run: Vec<ItemRecord> = reloaded.iter().cloned().collect();

    // Second run: 1 and 3 untouched, 2 attempted again
    let mut crawler = fixture
        .crawler(FakeCatalog::with_max_id(3).missing(&[2]))
        .await;
    let stats = crawler.run(&mut SilentReporter).await.unwrap();

    assert_eq!(stats.skipped, 2);
    assert_eq!(crawler.source().extract_calls, vec![2]);
    assert!(crawler.source().download_calls.is_empty());
    let second_run: Vec<ItemRecord> = crawler.store().iter().cloned().collect();
    assert_eq!(first_run, second_run);
}

#[tokio::test]
async fn test_failed_download_is_recorded_and_never_retried_by_crawl() {
    let fixture = Fixture::new();

    let mut crawler = fixture
        .crawler(FakeCatalog::with_max_id(5).failing_downloads(&[5]))
        .await;
    let stats = crawler.run(&mut SilentReporter).await.unwrap();

    assert_eq!(stats.download_failed, 1);
    let record = crawler.store().get(5).unwrap();
    assert!(!record.downloaded);
    assert!(!record.local_path(&fixture.storage_root).exists());

    let reloaded = CatalogStore::load(&fixture.snapshot).await.unwrap();
    assert!(!reloaded.get(5).unwrap().downloaded);

    // Next run would succeed, but id 5 is already known
    let mut crawler = fixture.crawler(FakeCatalog::with_max_id(5)).await;
    crawler.run(&mut SilentReporter).await.unwrap();

    assert!(crawler.source().extract_calls.is_empty());
    assert!(crawler.source().download_calls.is_empty());
    assert!(!crawler.store().get(5).unwrap().downloaded);
}

#[tokio::test]
async fn test_bound_failure_aborts_without_work() {
    let fixture = Fixture::new();
    let mut reporter = RecordingReporter::default();

    let mut crawler = fixture.crawler(FakeCatalog::default()).await;
    let result = crawler.run(&mut reporter).await;

    assert!(matches!(
        result,
        Err(BoundDiscoveryError::AnchorNotFound { .. })
    ));
    assert!(crawler.source().extract_calls.is_empty());
    assert!(crawler.source().download_calls.is_empty());
    assert!(!fixture.snapshot.exists());
    assert_eq!(reporter.events, vec!["bound-failed".to_string()]);
}

#[tokio::test]
async fn test_ascending_gapless_and_bounded() {
    let fixture = Fixture::new();

    let mut crawler = fixture.crawler(FakeCatalog::with_max_id(6)).await;
    let stats = crawler.run(&mut SilentReporter).await.unwrap();

    assert_eq!(stats.ids_visited, 6);
    assert_eq!(crawler.source().extract_calls, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(crawler.source().download_calls, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(stored_ids(crawler.store()), vec![1, 2, 3, 4, 5, 6]);
    assert!(!crawler.store().contains(7));
}

#[tokio::test]
async fn test_existing_ids_are_skipped_regardless_of_download_flag() {
    let fixture = Fixture::new();

    let mut seeded = CatalogStore::new(&fixture.snapshot);
    let mut done = record_for(2);
    done.downloaded = true;
    seeded.insert(done).unwrap();
    seeded.insert(record_for(3)).unwrap();
    seeded.save().await.unwrap();

    let mut crawler = fixture.crawler(FakeCatalog::with_max_id(4)).await;
    let stats = crawler.run(&mut SilentReporter).await.unwrap();

    assert_eq!(stats.skipped, 2);
    assert_eq!(crawler.source().extract_calls, vec![1, 4]);
    assert_eq!(crawler.source().download_calls, vec![1, 4]);
    // New ids are appended after the seeded ones
    assert_eq!(stored_ids(crawler.store()), vec![2, 3, 1, 4]);
    assert!(!crawler.store().get(3).unwrap().downloaded);
}

#[tokio::test]
async fn test_extraction_failure_is_isolated() {
    let fixture = Fixture::new();

    let mut crawler = fixture
        .crawler(FakeCatalog::with_max_id(5).missing(&[3]))
        .await;
    let stats = crawler.run(&mut SilentReporter).await.unwrap();

    assert_eq!(stats.ids_visited, 5);
    assert!(crawler.store().contains(2));
    assert!(!crawler.store().contains(3));
    assert!(crawler.store().contains(4));
    assert!(crawler.store().contains(5));
}

#[tokio::test]
async fn test_id_ceiling_limits_run() {
    let fixture = Fixture::new();
    let config = fixture.config().with_id_ceiling(Some(2));
    let store = CatalogStore::load(&fixture.snapshot).await.unwrap();

    let mut crawler = Crawler::new(config, FakeCatalog::with_max_id(10), store);
    let stats = crawler.run(&mut SilentReporter).await.unwrap();

    assert_eq!(stats.max_id, 10);
    assert_eq!(crawler.source().extract_calls, vec![1, 2]);
}

#[tokio::test]
async fn test_event_sequence() {
    let fixture = Fixture::new();
    let mut reporter = RecordingReporter::default();

    let mut crawler = fixture
        .crawler(FakeCatalog::with_max_id(2).failing_downloads(&[2]))
        .await;
    crawler.run(&mut reporter).await.unwrap();

    let half = ARTIFACT.len() / 2;
    let full = ARTIFACT.len();
    assert_eq!(
        reporter.events,
        vec![
            "bound 2 2".to_string(),
            "start 1".to_string(),
            "download 1".to_string(),
            format!("transfer 1 {}", half),
            format!("transfer 1 {}", full),
            "stored 1 true".to_string(),
            "start 2".to_string(),
            "download 2".to_string(),
            "download-failed 2".to_string(),
            "stored 2 false".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_save_failure_does_not_stop_run() {
    let fixture = Fixture::new();

    // Parent of the snapshot is a regular file, so every save fails
    let blocker = fixture.storage_root.with_file_name("not-a-dir");
    tokio::fs::write(&blocker, b"x").await.unwrap();
    let store = CatalogStore::new(blocker.join("ebooks.json"));

    let mut reporter = RecordingReporter::default();
    let mut crawler = Crawler::new(fixture.config(), FakeCatalog::with_max_id(2), store);
    let stats = crawler.run(&mut reporter).await.unwrap();

    assert_eq!(stats.stored, 2);
    assert_eq!(stats.save_failed, 2);
    assert_eq!(stored_ids(crawler.store()), vec![1, 2]);
    assert_eq!(
        reporter
            .events
            .iter()
            .filter(|event| *event == "save-failed")
            .count(),
        2
    );
}

#[tokio::test]
async fn test_retry_failed_downloads() {
    let fixture = Fixture::new();

    let mut crawler = fixture
        .crawler(FakeCatalog::with_max_id(3).failing_downloads(&[1, 3]))
        .await;
    crawler.run(&mut SilentReporter).await.unwrap();
    assert_eq!(crawler.store().summary().pending, 2);

    // Artifact host recovered for id 1 only
    let store = crawler.into_store();
    let mut crawler = Crawler::new(
        fixture.config(),
        FakeCatalog::with_max_id(3).failing_downloads(&[3]),
        store,
    );
    let stats = crawler.retry_failed_downloads(&mut SilentReporter).await;

    assert_eq!(stats.ids_visited, 2);
    assert_eq!(stats.downloaded, 1);
    assert_eq!(stats.download_failed, 1);
    assert!(crawler.source().extract_calls.is_empty());
    assert_eq!(crawler.source().download_calls, vec![1, 3]);

    let reloaded = CatalogStore::load(&fixture.snapshot).await.unwrap();
    assert!(reloaded.get(1).unwrap().downloaded);
    assert!(!reloaded.get(3).unwrap().downloaded);
}

#[tokio::test]
async fn test_new_item_replacing_existing_file_is_reported() {
    let fixture = Fixture::new();
    let existing = record_for(1).local_path(&fixture.storage_root);
    tokio::fs::create_dir_all(existing.parent().unwrap())
        .await
        .unwrap();
    tokio::fs::write(&existing, b"left over from another item")
        .await
        .unwrap();

    let mut crawler = fixture.crawler(FakeCatalog::with_max_id(2)).await;
    let mut reporter = RecordingReporter::default();
    let stats = crawler.run(&mut reporter).await.unwrap();

    assert_eq!(stats.stored, 2);
    assert!(reporter.events.contains(&"overwrite 1".to_string()));
    assert!(!reporter.events.contains(&"overwrite 2".to_string()));
    let overwrite = reporter.events.iter().position(|e| e == "overwrite 1");
    let download = reporter.events.iter().position(|e| e == "download 1");
    assert!(overwrite < download);
    assert_eq!(tokio::fs::read(&existing).await.unwrap(), ARTIFACT);
}
