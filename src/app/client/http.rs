//! Core HTTP operations
//!
//! Requests are issued one at a time and never retried; a failed request is
//! reported to the caller, which decides what the failure means for the crawl.

use std::time::Duration;

use reqwest::header::REFERER;
use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::errors::{DownloadError, DownloadResult};

/// HTTP operations handler
#[derive(Debug, Clone)]
pub struct HttpHandler {
    client: Client,
    page_timeout: Duration,
    idle_timeout: Duration,
}

impl HttpHandler {
    /// Creates a new HttpHandler around the given client
    ///
    /// `page_timeout` bounds a whole page request; `idle_timeout` bounds the
    /// wait for response headers and for every body chunk of a streamed
    /// response.
    pub fn new(client: Client, page_timeout: Duration, idle_timeout: Duration) -> Self {
        Self {
            client,
            page_timeout,
            idle_timeout,
        }
    }

    /// Sends a GET request and checks the response status
    ///
    /// The body is left unread so callers can stream it; no total timeout
    /// applies to it.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` on transport failure, a non-success status or
    /// when no response arrives within the idle timeout
    pub async fn get_response(&self, url: &Url, referer: Option<&str>) -> DownloadResult<Response> {
        let mut request = self.client.get(url.as_str());
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = tokio::time::timeout(self.idle_timeout, request.send())
            .await
            .map_err(|_| DownloadError::Stalled {
                idle: self.idle_timeout,
            })??;
        Self::check_status(url, response.status())?;

        tracing::debug!("Fetched response: {} ({})", url, response.status());
        Ok(response)
    }

    /// Fetches the body of a page as text
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` on transport failure, a non-success status or
    /// when the page is not complete within the page timeout
    pub async fn get_page(&self, url: &Url) -> DownloadResult<String> {
        let response = self
            .client
            .get(url.as_str())
            .timeout(self.page_timeout)
            .send()
            .await?;
        Self::check_status(url, response.status())?;

        let text = response.text().await?;
        tracing::debug!("Fetched page: {} ({} bytes)", url, text.len());
        Ok(text)
    }

    /// Longest wait for the next piece of a streamed response
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    fn check_status(url: &Url, status: StatusCode) -> DownloadResult<()> {
        if status.is_success() {
            return Ok(());
        }

        Err(match status {
            StatusCode::NOT_FOUND => DownloadError::NotFound {
                url: url.to_string(),
            },
            StatusCode::FORBIDDEN => DownloadError::Forbidden {
                url: url.to_string(),
            },
            other => DownloadError::ServerError {
                status: other.as_u16(),
            },
        })
    }
}
