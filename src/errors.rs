//! Error types for the e-book fetcher
//!
//! Each pipeline stage has its own error type so the crawl controller can
//! decide, per variant, whether a failure is fatal for the run or only for
//! the current catalog item.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// HTTP transfer and artifact download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Resource does not exist
    #[error("Resource not found: {url}")]
    NotFound { url: String },

    /// Access to the resource was refused
    #[error("Access forbidden: {url}")]
    Forbidden { url: String },

    /// Server returned error status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// No data arrived within the idle timeout
    #[error("Transfer stalled: no data received for {idle:?}")]
    Stalled { idle: Duration },

    /// Body ended before the declared content length was reached
    #[error("Incomplete download: received {received} bytes, expected {expected} bytes")]
    IncompleteDownload { received: u64, expected: u64 },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },
}

/// Failure to determine the highest item id currently in the catalog
#[derive(Error, Debug)]
pub enum BoundDiscoveryError {
    /// Landing page could not be fetched
    #[error("Failed to fetch catalog landing page: {0}")]
    Fetch(#[from] DownloadError),

    /// Landing page did not contain the latest-item anchor
    #[error("Latest item anchor not found on landing page (selector: {selector})")]
    AnchorNotFound { selector: String },

    /// Anchor found but its href did not carry a numeric id
    #[error("Could not parse latest item id from link: {href}")]
    InvalidId { href: String },
}

/// Per-item metadata extraction errors
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Item page could not be fetched
    #[error("Item #{id}: failed to fetch page: {source}")]
    Fetch {
        id: u32,
        #[source]
        source: DownloadError,
    },

    /// A required metadata field is absent from the page
    #[error("Item #{id}: required field '{field}' not found")]
    MissingField { id: u32, field: &'static str },

    /// No outbound link points at the artifact host
    #[error("Item #{id}: no download link found")]
    NoDownloadLink { id: u32 },

    /// Field present but unusable (e.g. empty after sanitizing)
    #[error("Item #{id}: field '{field}' has unusable value {value:?}")]
    InvalidField {
        id: u32,
        field: &'static str,
        value: String,
    },

    /// Selector failed to compile
    #[error("Invalid CSS selector: {selector}")]
    InvalidSelector { selector: String },
}

impl ExtractError {
    /// Catalog id the failure belongs to, if any
    pub fn id(&self) -> Option<u32> {
        match self {
            ExtractError::Fetch { id, .. }
            | ExtractError::MissingField { id, .. }
            | ExtractError::NoDownloadLink { id }
            | ExtractError::InvalidField { id, .. } => Some(*id),
            ExtractError::InvalidSelector { .. } => None,
        }
    }
}

/// Catalog snapshot persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the snapshot failed
    #[error("Snapshot I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot exists but is not valid
    #[error("Snapshot {path} could not be decoded: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Store could not be encoded
    #[error("Snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Snapshot written by an unknown format version
    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Insertion of an id that is already stored
    #[error("Item #{id} is already present in the catalog store")]
    DuplicateId { id: u32 },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration file format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be rendered as TOML
    #[error("Configuration serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Configuration file could not be read or written
    #[error("Configuration file error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Explicitly requested configuration file does not exist
    #[error("Specified config file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// No user configuration directory on this platform
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Bound discovery error
    #[error(transparent)]
    BoundDiscovery(#[from] BoundDiscoveryError),

    /// Extraction error
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Download(_) => "download",
            AppError::BoundDiscovery(_) => "discovery",
            AppError::Extract(_) => "extraction",
            AppError::Store(_) => "store",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Extraction result type alias
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Store result type alias
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
