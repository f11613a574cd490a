//! HTTP client for the remote catalog
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: request/response handling and status mapping
//! - `download`: streamed artifact downloads with atomic writes

use std::path::Path;

use url::Url;

use crate::constants::catalog;
use crate::errors::{DownloadError, DownloadResult};

pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;
pub use download::{DownloadHandler, DownloadProgress};

use http::HttpHandler;

/// HTTP client bound to one catalog site
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http_handler: HttpHandler,
    base_url: Url,
}

impl CatalogClient {
    /// Creates a client for the catalog rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the URL is invalid or the HTTP client
    /// cannot be built
    pub fn new(config: &ClientConfig, base_url: &str) -> DownloadResult<Self> {
        let mut base_url = download::parse_http_url(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = config.build_http_client()?;
        tracing::debug!("Created catalog client for {}", base_url);

        Ok(Self {
            http_handler: HttpHandler::new(client, config.request_timeout, config.idle_timeout),
            base_url,
        })
    }

    /// Catalog landing page
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Canonical page address of item `id`: `{base}/book/{id}/`
    pub fn item_url(&self, id: u32) -> DownloadResult<Url> {
        let relative = format!("{}/{}/", catalog::ITEM_PATH, id);
        self.base_url
            .join(&relative)
            .map_err(|e| DownloadError::InvalidUrl {
                url: relative,
                error: e.to_string(),
            })
    }

    /// Fetches the HTML content of a page
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the request fails or the status is not a success
    pub async fn get_page(&self, url: &Url) -> DownloadResult<String> {
        self.http_handler.get_page(url).await
    }

    /// Streams the artifact at `url` to `destination`
    ///
    /// `referer` is sent as the `Referer` header; the artifact host refuses
    /// requests that do not come from an item page.
    ///
    /// # Errors
    ///
    /// See [`DownloadHandler::download_file`]
    pub async fn download_file<P>(
        &self,
        url: &str,
        destination: &Path,
        referer: Option<&str>,
        progress: &mut P,
    ) -> DownloadResult<u64>
    where
        P: DownloadProgress + ?Sized,
    {
        DownloadHandler::new(&self.http_handler)
            .download_file(url, destination, referer, progress)
            .await
    }
}
