//! Configuration management for the e-book fetcher
//!
//! Settings come from several sources, later ones winning:
//! 1. Built-in defaults
//! 2. A TOML config file (explicit `--config`, project-local, user or system)
//! 3. `EBOOK_FETCHER_*` environment variables
//! 4. Command-line flags, applied by the command handlers

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::{ClientConfig, CrawlConfig};
use crate::constants::{catalog, env, files, http};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Remote catalog settings
    pub catalog: CatalogConfigToml,
    /// Snapshot and artifact locations
    pub storage: StorageConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly catalog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfigToml {
    /// Catalog landing page
    pub base_url: String,
    /// Substring identifying artifact links on item pages
    pub artifact_host_pattern: String,
}

impl Default for CatalogConfigToml {
    fn default() -> Self {
        Self {
            base_url: catalog::BASE_URL.to_string(),
            artifact_host_pattern: catalog::ARTIFACT_HOST_PATTERN.to_string(),
        }
    }
}

/// TOML-friendly storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfigToml {
    /// JSON snapshot of the catalog store
    pub snapshot_path: PathBuf,
    /// Directory that artifact save paths are resolved against
    pub storage_root: PathBuf,
}

impl Default for StorageConfigToml {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(files::SNAPSHOT_FILE_NAME),
            storage_root: PathBuf::from("."),
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// User agent sent with every request
    pub user_agent: String,
    /// Timeout in seconds for one complete catalog page request
    pub request_timeout_secs: u64,
    /// Artifact transfers fail after this many seconds without data
    pub idle_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// TCP keep-alive interval in seconds (None = disabled)
    pub tcp_keepalive_secs: Option<u64>,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            user_agent: http::USER_AGENT.to_string(),
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            idle_timeout_secs: http::IDLE_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            tcp_keepalive_secs: Some(http::TCP_KEEPALIVE.as_secs()),
            tcp_nodelay: true,
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicitly requested file must exist; the standard locations are
    /// optional.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `EBOOK_FETCHER_*` overrides using `lookup` to read variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = non_empty(env::BASE_URL) {
            debug!("{} overrides catalog base URL", env::BASE_URL);
            self.catalog.base_url = base_url;
        }
        if let Some(snapshot) = non_empty(env::SNAPSHOT_PATH) {
            debug!("{} overrides snapshot path", env::SNAPSHOT_PATH);
            self.storage.snapshot_path = PathBuf::from(snapshot);
        }
        if let Some(root) = non_empty(env::STORAGE_ROOT) {
            debug!("{} overrides storage root", env::STORAGE_ROOT);
            self.storage.storage_root = PathBuf::from(root);
        }
    }

    /// Check values that would otherwise fail deep inside a crawl
    pub fn validate(&self) -> ConfigResult<()> {
        match Url::parse(&self.catalog.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ConfigError::InvalidValue {
                    field: "catalog.base_url".to_string(),
                    value: self.catalog.base_url.clone(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                })
            }
            Err(e) => {
                return Err(ConfigError::InvalidValue {
                    field: "catalog.base_url".to_string(),
                    value: self.catalog.base_url.clone(),
                    reason: e.to_string(),
                })
            }
        }

        if self.catalog.artifact_host_pattern.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "catalog.artifact_host_pattern".to_string(),
                value: self.catalog.artifact_host_pattern.clone(),
                reason: "pattern must not be empty".to_string(),
            });
        }

        for (field, secs) in [
            ("client.request_timeout_secs", self.client.request_timeout_secs),
            ("client.idle_timeout_secs", self.client.idle_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: "0".to_string(),
                    reason: "timeout must be greater than 0".to_string(),
                });
            }
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.logging.level.clone(),
                reason: "expected one of error, warn, info, debug, trace".to_string(),
            });
        }

        Ok(())
    }

    /// Crawl settings derived from the storage section
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig::default().with_storage_root(self.storage.storage_root.clone())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write a commented default config file
    ///
    /// Writes to `path`, or to the user config directory when `None`. An
    /// existing file is only replaced when `force` is set; the returned flag
    /// tells whether anything was written.
    pub async fn write_default_file(
        path: Option<PathBuf>,
        force: bool,
    ) -> ConfigResult<(PathBuf, bool)> {
        let config_path = match path {
            Some(path) => path,
            None => Self::get_default_config_path()?,
        };

        if config_path.exists() && !force {
            debug!("Config file already exists: {}", config_path.display());
            return Ok((config_path, false));
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| ConfigError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: config_path.clone(),
                source,
            })?;

        info!("Wrote default configuration to {}", config_path.display());
        Ok((config_path, true))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(format!("./{}", files::CONFIG_FILE_NAME))];
        if let Ok(user_path) = Self::get_default_config_path() {
            search_paths.push(user_path);
        }
        #[cfg(unix)]
        search_paths.push(PathBuf::from(format!(
            "/etc/{}/config.toml",
            files::CONFIG_DIR_NAME
        )));

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(files::CONFIG_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# E-book Fetcher Configuration
# Every setting is optional; missing keys fall back to the values below.

[catalog]
# Catalog landing page (env: {base_env})
base_url = "{base_url}"
# Substring that identifies artifact links on item pages
artifact_host_pattern = "{pattern}"

[storage]
# JSON snapshot of every item seen so far (env: {snapshot_env})
snapshot_path = "{snapshot}"
# Directory that artifact paths are resolved against (env: {root_env})
storage_root = "."

[client]
user_agent = "{user_agent}"
# Covers one complete catalog page request
request_timeout_secs = {request_timeout}
# An artifact transfer fails after this long without receiving data
idle_timeout_secs = {idle_timeout}
connect_timeout_secs = {connect_timeout}
tcp_keepalive_secs = {keepalive}
tcp_nodelay = true
pool_idle_timeout_secs = {pool_idle}

[logging]
level = "warn"  # error, warn, info, debug, trace
"#,
            base_env = env::BASE_URL,
            base_url = catalog::BASE_URL,
            pattern = catalog::ARTIFACT_HOST_PATTERN,
            snapshot_env = env::SNAPSHOT_PATH,
            snapshot = files::SNAPSHOT_FILE_NAME,
            root_env = env::STORAGE_ROOT,
            user_agent = http::USER_AGENT,
            request_timeout = http::DEFAULT_TIMEOUT.as_secs(),
            idle_timeout = http::IDLE_TIMEOUT.as_secs(),
            connect_timeout = http::CONNECT_TIMEOUT.as_secs(),
            keepalive = http::TCP_KEEPALIVE.as_secs(),
            pool_idle = http::POOL_IDLE_TIMEOUT.as_secs(),
        )
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            user_agent: self.user_agent.clone(),
            tcp_keepalive: self.tcp_keepalive_secs.map(Duration::from_secs),
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}
