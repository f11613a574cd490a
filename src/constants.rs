//! Application constants for the e-book fetcher
//!
//! Constants are grouped by functional domain.

use std::time::Duration;

/// Environment variable names for configuration overrides
pub mod env {
    /// Overrides `[catalog] base_url`
    pub const BASE_URL: &str = "EBOOK_FETCHER_BASE_URL";

    /// Overrides `[storage] snapshot_path`
    pub const SNAPSHOT_PATH: &str = "EBOOK_FETCHER_SNAPSHOT";

    /// Overrides `[storage] storage_root`
    pub const STORAGE_ROOT: &str = "EBOOK_FETCHER_OUTPUT";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("ebook-fetcher/", env!("CARGO_PKG_VERSION"));

    /// Timeout for one complete catalog page request
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Longest silence tolerated while waiting for artifact data
    pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// TCP keep-alive interval
    pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
}

/// Remote catalog layout
pub mod catalog {
    /// Catalog landing page
    pub const BASE_URL: &str = "http://it-ebooks.info";

    /// Path prefix of item pages; an item lives at `{BASE_URL}/book/{id}/`
    pub const ITEM_PATH: &str = "book";

    /// Substring identifying links to the artifact host
    pub const ARTIFACT_HOST_PATTERN: &str = "filepi.com";

    /// First id of the catalog
    pub const FIRST_ID: u32 = 1;
}

/// Web scraping CSS selectors
pub mod selectors {
    /// Anchor of the most recently added item on the landing page
    pub const LATEST_ITEM_SELECTOR: &str = "td[width='120'] a";

    /// All outbound links on an item page
    pub const LINK_SELECTOR: &str = "a[href]";

    pub const TITLE: &str = "[itemprop='name']";
    pub const DESCRIPTION: &str = "[itemprop='description']";
    pub const PUBLISHER: &str = "[itemprop='publisher']";
    pub const AUTHOR: &str = "[itemprop='author']";
    pub const ISBN: &str = "[itemprop='isbn']";
    pub const DATE_PUBLISHED: &str = "[itemprop='datePublished']";
    pub const PAGE_COUNT: &str = "[itemprop='numberOfPages']";
    pub const LANGUAGE: &str = "[itemprop='inLanguage']";
    pub const FORMAT: &str = "[itemprop='bookFormat']";
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Default catalog snapshot file name
    pub const SNAPSHOT_FILE_NAME: &str = "ebooks.json";

    /// Snapshot format version written by this build
    pub const SNAPSHOT_VERSION: u32 = 1;

    /// Project-local configuration file name
    pub const CONFIG_FILE_NAME: &str = "ebook-fetcher.toml";

    /// Directory under the user config dir
    pub const CONFIG_DIR_NAME: &str = "ebook-fetcher";
}

/// Progress reporting
pub mod progress {
    /// Byte size units, each 1024 times the previous
    pub const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    /// Steady tick for the discovery spinner (milliseconds)
    pub const SPINNER_TICK_MS: u64 = 120;
}

pub use catalog::{ARTIFACT_HOST_PATTERN, BASE_URL as CATALOG_BASE_URL};
pub use files::{SNAPSHOT_FILE_NAME, TEMP_FILE_SUFFIX};
pub use http::USER_AGENT;
