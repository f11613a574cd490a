//! Streaming artifact downloads with atomic writes
//!
//! The response body is copied chunk by chunk into a temporary sibling of the
//! destination and renamed into place only once the transfer is complete, so
//! an interrupted download never leaves a truncated file under the final name.

use std::path::Path;

use futures::StreamExt;
use reqwest::Response;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::app::path::temp_path_for;
use crate::errors::{DownloadError, DownloadResult};

/// Receives transfer progress after every chunk
///
/// `total` is the content length declared by the server, if any.
pub trait DownloadProgress {
    fn on_progress(&mut self, transferred: u64, total: Option<u64>);
}

impl<F> DownloadProgress for F
where
    F: FnMut(u64, Option<u64>),
{
    fn on_progress(&mut self, transferred: u64, total: Option<u64>) {
        self(transferred, total)
    }
}

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler) -> Self {
        Self { http_handler }
    }

    /// Streams `url` to `destination`, returning the number of bytes written
    ///
    /// Missing parent directories are created once the server has answered
    /// with a success status. An existing file at `destination` is replaced
    /// once the new transfer has completed.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - `url` is not an absolute http(s) URL
    /// - The request fails or the server answers with a non-success status
    /// - No data arrives for longer than the idle timeout
    /// - The body is shorter or longer than the declared content length
    /// - File I/O operations fail
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
        let url = parse_http_url(url)?;
        let response = self.http_handler.get_response(&url, referer).await?;

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = temp_path_for(destination);

        match self.stream_to_temp(response, &temp_path, progress).await {
            Ok(written) => {
                tokio::fs::rename(&temp_path, destination)
                    .await
                    .map_err(|_e| DownloadError::AtomicOperationFailed {
                        temp_path: temp_path.clone(),
                        final_path: destination.to_path_buf(),
                    })?;
                tracing::info!(
                    "Downloaded {} ({} bytes)",
                    destination.display(),
                    written
                );
                Ok(written)
            }
            Err(e) => {
                if tokio::fs::try_exists(&temp_path).await.unwrap_or(false) {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                }
                tracing::debug!("Download of {} failed: {}", url, e);
                Err(e)
            }
        }
    }

    async fn stream_to_temp<P>(
        &self,
        response: Response,
        temp_path: &Path,
        progress: &mut P,
    ) -> DownloadResult<u64>
    where
        P: DownloadProgress + ?Sized,
    {
        let idle = self.http_handler.idle_timeout();
        let total = response.content_length();

        let mut file = File::create(temp_path).await?;
        let mut stream = response.bytes_stream();
        let mut transferred: u64 = 0;

        progress.on_progress(transferred, total);

        loop {
            let next = tokio::time::timeout(idle, stream.next())
                .await
                .map_err(|_| DownloadError::Stalled { idle })?;
            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => return Err(truncation_error(e, transferred, total)),
                None => break,
            };
            file.write_all(&chunk).await?;
            transferred += chunk.len() as u64;
            progress.on_progress(transferred, total);
        }

        file.flush().await?;
        file.sync_all().await?;

        if let Some(expected) = total {
            if transferred != expected {
                return Err(DownloadError::IncompleteDownload {
                    received: transferred,
                    expected,
                });
            }
        }

        Ok(transferred)
    }
}

/// Maps a body error to `IncompleteDownload` when the connection ended
/// before the declared length arrived
fn truncation_error(error: reqwest::Error, transferred: u64, total: Option<u64>) -> DownloadError {
    match total {
        Some(expected) if transferred < expected => {
            tracing::debug!("Body ended early after {} bytes: {}", transferred, error);
            DownloadError::IncompleteDownload {
                received: transferred,
                expected,
            }
        }
        _ => error.into(),
    }
}

/// Parses `url` and requires an http or https scheme
pub fn parse_http_url(url: &str) -> DownloadResult<Url> {
    let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
        url: url.to_string(),
        error: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(DownloadError::InvalidUrl {
            url: url.to_string(),
            error: format!("unsupported scheme '{}'", scheme),
        }),
    }
}
