//! Command handlers for the e-book fetcher CLI
//!
//! Each handler resolves the effective configuration (file, environment and
//! command-line flags), builds the pieces it needs from the library and
//! prints a short report.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use crate::app::{
    CatalogClient, CatalogStore, CrawlStats, Crawler, HttpCatalogSource, ItemRecord, StoreSummary,
};
use crate::cli::progress::{format_bytes, ConsoleReporter};
use crate::cli::{ConfigAction, ConfigArgs, CrawlArgs, GlobalArgs, ListArgs, RetryArgs, StatusArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the crawl command
///
/// Loads the snapshot, discovers the catalog's upper bound and visits every
/// id up to it. Per-item failures are reported and the run continues; only a
/// failed bound discovery or an unreadable snapshot end the command with an
/// error.
pub async fn handle_crawl(global: &GlobalArgs, args: CrawlArgs) -> Result<()> {
    let start_time = Instant::now();
    args.validate().map_err(AppError::generic)?;

    let mut config = AppConfig::load(global.config.clone()).await?;
    if let Some(base_url) = args.base_url.clone() {
        config.catalog.base_url = base_url;
        config.validate()?;
    }
    let snapshot_path = args
        .snapshot
        .clone()
        .unwrap_or_else(|| config.storage.snapshot_path.clone());
    let storage_root = args
        .output
        .clone()
        .unwrap_or_else(|| config.storage.storage_root.clone());

    let store = load_store(snapshot_path, global.quiet).await?;

    info!("Crawling {}", config.catalog.base_url);
    let client = CatalogClient::new(&config.client.to_runtime_config(), &config.catalog.base_url)?;
    let source = HttpCatalogSource::new(client, config.catalog.artifact_host_pattern.clone());
    let crawl_config = config
        .crawl_config()
        .with_storage_root(storage_root)
        .with_id_ceiling(args.up_to);

    let mut crawler = Crawler::new(crawl_config, source, store);
    let stats = {
        let mut reporter = ConsoleReporter::new(global.show_progress(args.no_progress));
        crawler.run(&mut reporter).await?
    };

    if !global.quiet {
        print_crawl_summary(&stats, crawler.store().summary());
        println!("  Total time: {:?}", start_time.elapsed());
    }
    if stats.download_failed > 0 {
        warn!(
            "{} downloads failed; run 'ebook_fetcher retry-failed' to try again",
            stats.download_failed
        );
    }

    Ok(())
}

/// Handle the retry-failed command
pub async fn handle_retry(global: &GlobalArgs, args: RetryArgs) -> Result<()> {
    let config = AppConfig::load(global.config.clone()).await?;
    let snapshot_path = args
        .snapshot
        .clone()
        .unwrap_or_else(|| config.storage.snapshot_path.clone());
    let storage_root = args
        .output
        .clone()
        .unwrap_or_else(|| config.storage.storage_root.clone());

    let store = load_store(snapshot_path, global.quiet).await?;
    let pending = store.summary().pending;
    if pending == 0 {
        if !global.quiet {
            println!("ℹ️  No failed downloads to retry");
        }
        return Ok(());
    }

    let client = CatalogClient::new(&config.client.to_runtime_config(), &config.catalog.base_url)?;
    let source = HttpCatalogSource::new(client, config.catalog.artifact_host_pattern.clone());
    let mut crawler = Crawler::new(
        config.crawl_config().with_storage_root(storage_root),
        source,
        store,
    );

    if !global.quiet {
        println!("🔁 Retrying {} downloads...", pending);
    }
    let stats = {
        let mut reporter = ConsoleReporter::new(global.show_progress(args.no_progress));
        crawler.retry_failed_downloads(&mut reporter).await
    };

    if !global.quiet {
        println!("\n📊 Retry Summary:");
        println!("  Attempted: {}", stats.ids_visited);
        println!("  Downloaded: {}", stats.downloaded);
        println!("  Still failing: {}", stats.download_failed);
        println!("  Data written: {}", format_bytes(stats.bytes_downloaded));
    }
    if stats.save_failed > 0 {
        return Err(AppError::generic(format!(
            "{} snapshot saves failed during retry",
            stats.save_failed
        )));
    }

    Ok(())
}

/// Handle the status command
pub async fn handle_status(global: &GlobalArgs, args: StatusArgs) -> Result<()> {
    let config = AppConfig::load(global.config.clone()).await?;
    let snapshot_path = args
        .snapshot
        .unwrap_or_else(|| config.storage.snapshot_path.clone());

    let store = CatalogStore::load(snapshot_path).await?;
    let summary = store.summary();
    let highest = store.iter().map(|record| record.id).max();

    println!("📚 Catalog Snapshot");
    println!("==================");
    println!("Location: {}", store.path().display());
    println!("Stored items: {}", summary.total);
    println!("Downloaded: {}", summary.downloaded);
    println!("Pending downloads: {}", summary.pending);
    match highest {
        Some(id) => println!("Highest stored id: #{}", id),
        None => println!("Highest stored id: none"),
    }

    Ok(())
}

/// Handle the list command
pub async fn handle_list(global: &GlobalArgs, args: ListArgs) -> Result<()> {
    let config = AppConfig::load(global.config.clone()).await?;
    let snapshot_path = args
        .snapshot
        .unwrap_or_else(|| config.storage.snapshot_path.clone());

    let store = CatalogStore::load(snapshot_path).await?;
    let records: Vec<&ItemRecord> = if args.pending {
        store.pending().collect()
    } else {
        store.iter().collect()
    };

    if records.is_empty() {
        if !global.quiet {
            println!("No items to list");
        }
        return Ok(());
    }

    for record in records {
        println!("{}", list_line(record));
    }

    Ok(())
}

/// Handle configuration management
pub async fn handle_config(global: &GlobalArgs, args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Init { path, force } => {
            let (path, written) = AppConfig::write_default_file(path, force).await?;
            if written {
                println!("📁 Created default configuration file:");
                println!("   {}", path.display());
                println!("   You can customize settings by editing this file.");
            } else {
                println!(
                    "✅ Configuration file already exists: {} (use --force to overwrite)",
                    path.display()
                );
            }
        }
        ConfigAction::Show => {
            let config = AppConfig::load(global.config.clone()).await?;
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

async fn load_store(snapshot_path: PathBuf, quiet: bool) -> Result<CatalogStore> {
    let store = CatalogStore::load(snapshot_path).await?;
    info!(
        "Loaded {} items from {}",
        store.len(),
        store.path().display()
    );
    if !quiet {
        println!("Total items in snapshot: {}", store.len());
    }
    Ok(store)
}

fn print_crawl_summary(stats: &CrawlStats, store: StoreSummary) {
    print!("{}", crawl_summary(stats, store));
}

fn crawl_summary(stats: &CrawlStats, store: StoreSummary) -> String {
    let mut lines = vec![
        "\n📊 Crawl Summary:".to_string(),
        format!("  Latest item id: #{}", stats.max_id),
        format!("  Ids visited: {}", stats.ids_visited),
        format!("  Ids processed: {}", stats.processed()),
        format!("  Already stored: {}", stats.skipped),
        format!("  New items: {}", stats.stored),
        format!("  Downloaded: {}", stats.downloaded),
        format!("  Download failures: {}", stats.download_failed),
        format!("  Extraction failures: {}", stats.extract_failed),
        format!("  Data written: {}", format_bytes(stats.bytes_downloaded)),
        format!(
            "  Snapshot: {} items ({} pending downloads)",
            store.total, store.pending
        ),
    ];
    if stats.save_failed > 0 {
        lines.push(format!("  ⚠️  Snapshot saves failed: {}", stats.save_failed));
    }
    lines.join("\n") + "\n"
}

fn list_line(record: &ItemRecord) -> String {
    let marker = if record.downloaded { "✓" } else { "✗" };
    format!("{} #{:<6} {} [{}]", marker, record.id, record.title, record.save_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::sample_metadata;
    use tempfile::TempDir;

    #[test]
    fn test_list_line() {
        let mut record = ItemRecord::new(
            12,
            "http://it-ebooks.info/book/12/",
            sample_metadata("Rust in Action"),
        );
        assert_eq!(
            list_line(&record),
            "✗ #12     Rust in Action [OReilly Media/Rust in Action/Rust in Action.pdf]"
        );

        record.downloaded = true;
        assert!(list_line(&record).starts_with("✓ #12"));
    }

    #[test]
    fn test_crawl_summary_counts_processed_ids() {
        let stats = CrawlStats {
            max_id: 10,
            ids_visited: 10,
            skipped: 7,
            stored: 2,
            downloaded: 2,
            extract_failed: 1,
            bytes_downloaded: 1536,
            ..Default::default()
        };
        let summary = crawl_summary(
            &stats,
            StoreSummary {
                total: 9,
                downloaded: 9,
                pending: 0,
            },
        );

        assert!(summary.contains("  Ids processed: 3\n"));
        assert!(summary.contains("  Data written: 1.50KB\n"));
        assert!(summary.contains("  Snapshot: 9 items (0 pending downloads)\n"));
        assert!(!summary.contains("Snapshot saves failed"));
    }

    #[tokio::test]
    async fn test_status_and_list_on_missing_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let snapshot = temp_dir.path().join("ebooks.json");
        let config_path = temp_dir.path().join("config.toml");
        tokio::fs::write(&config_path, "").await.unwrap();

        let global = GlobalArgs {
            quiet: true,
            config: Some(config_path),
            ..Default::default()
        };

        handle_status(
            &global,
            StatusArgs {
                snapshot: Some(snapshot.clone()),
            },
        )
        .await
        .unwrap();
        handle_list(
            &global,
            ListArgs {
                snapshot: Some(snapshot.clone()),
                pending: true,
            },
        )
        .await
        .unwrap();

        // Inspection never creates the snapshot
        assert!(!snapshot.exists());
    }

    #[tokio::test]
    async fn test_retry_with_nothing_pending() {
        let temp_dir = TempDir::new().unwrap();
        let snapshot = temp_dir.path().join("ebooks.json");
        let config_path = temp_dir.path().join("config.toml");
        tokio::fs::write(&config_path, "").await.unwrap();

        let mut store = CatalogStore::new(&snapshot);
        let mut record = ItemRecord::new(
            1,
            "http://it-ebooks.info/book/1/",
            sample_metadata("Done Already"),
        );
        record.downloaded = true;
        store.insert(record).unwrap();
        store.save().await.unwrap();

        let global = GlobalArgs {
            quiet: true,
            config: Some(config_path),
            ..Default::default()
        };
        handle_retry(
            &global,
            RetryArgs {
                snapshot: Some(snapshot),
                output: Some(temp_dir.path().to_path_buf()),
                no_progress: true,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_crawl_rejects_zero_ceiling() {
        let result = handle_crawl(
            &GlobalArgs::default(),
            CrawlArgs {
                up_to: Some(0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Generic { .. })));
    }
}
