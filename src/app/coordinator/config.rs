//! Crawl controller configuration

use std::path::PathBuf;

use crate::constants::catalog;

/// Settings for one crawl run
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Directory artifacts are written under (`{root}/{publisher}/{title}/...`)
    pub storage_root: PathBuf,
    /// First id to visit
    pub first_id: u32,
    /// Optional cap below the discovered upper bound
    pub id_ceiling: Option<u32>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("."),
            first_id: catalog::FIRST_ID,
            id_ceiling: None,
        }
    }
}

impl CrawlConfig {
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    pub fn with_id_ceiling(mut self, ceiling: Option<u32>) -> Self {
        self.id_ceiling = ceiling;
        self
    }

    /// Last id to visit given the discovered bound
    pub fn last_id(&self, max_id: u32) -> u32 {
        match self.id_ceiling {
            Some(ceiling) => ceiling.min(max_id),
            None => max_id,
        }
    }
}
