//! Catalog access used by the crawl controller
//!
//! The controller only sees this trait; the HTTP implementation lives here
//! and tests substitute an in-memory catalog.

use std::path::Path;

use crate::app::client::{CatalogClient, DownloadProgress};
use crate::app::extract::MetadataExtractor;
use crate::app::models::ItemRecord;
use crate::errors::{BoundDiscoveryError, DownloadResult, ExtractResult};

/// Remote catalog operations needed by one crawl
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    /// Highest item id currently in the catalog
    async fn discover_max_id(&mut self) -> Result<u32, BoundDiscoveryError>;

    /// Fully populated record for `id`
    async fn extract(&mut self, id: u32) -> ExtractResult<ItemRecord>;

    /// Stream the artifact of `record` to `destination`
    async fn download(
        &mut self,
        record: &ItemRecord,
        destination: &Path,
        progress: &mut dyn DownloadProgress,
    ) -> DownloadResult<u64>;
}

/// Catalog reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    extractor: MetadataExtractor,
}

impl HttpCatalogSource {
    pub fn new(client: CatalogClient, artifact_host_pattern: impl Into<String>) -> Self {
        Self {
            extractor: MetadataExtractor::new(client, artifact_host_pattern),
        }
    }
}

impl CatalogSource for HttpCatalogSource {
    async fn discover_max_id(&mut self) -> Result<u32, BoundDiscoveryError> {
        self.extractor.discover_max_id().await
    }

    async fn extract(&mut self, id: u32) -> ExtractResult<ItemRecord> {
        self.extractor.extract(id).await
    }

    async fn download(
        &mut self,
        record: &ItemRecord,
        destination: &Path,
        progress: &mut dyn DownloadProgress,
    ) -> DownloadResult<u64> {
        self.extractor
            .client()
            .download_file(
                &record.download_url,
                destination,
                Some(&record.source_url),
                progress,
            )
            .await
    }
}
