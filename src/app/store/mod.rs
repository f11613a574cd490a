//! Catalog store: every known item, keyed by catalog id
//!
//! The store keeps records in insertion order and is persisted as a whole to
//! a single JSON snapshot. It is append-only: once an id has been inserted its
//! record is never replaced.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ebook_fetcher::app::CatalogStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CatalogStore::load("ebooks.json").await?;
//! println!("{} items known, {} downloaded", store.len(), store.summary().downloaded);
//! # Ok(())
//! # }
//! ```

pub mod snapshot;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::app::models::ItemRecord;
use crate::errors::{StoreError, StoreResult};

/// Counts over the stored records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub total: usize,
    pub downloaded: usize,
    pub pending: usize,
}

/// In-memory catalog state bound to its snapshot file
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
    items: Vec<ItemRecord>,
    index: HashMap<u32, usize>,
}

impl CatalogStore {
    /// Empty store that will persist to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Load the snapshot at `path`, or start empty if there is none
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the snapshot exists but cannot be read or
    /// decoded, or lists the same id twice
    pub async fn load(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let mut store = Self::new(path);

        match snapshot::read(&store.path).await? {
            Some(items) => {
                for record in items {
                    store.insert(record)?;
                }
                tracing::info!(
                    "Loaded {} items from {}",
                    store.len(),
                    store.path.display()
                );
            }
            None => {
                tracing::info!(
                    "No snapshot at {}, starting with an empty catalog",
                    store.path.display()
                );
            }
        }

        Ok(store)
    }

    /// Persist the full store, replacing the snapshot atomically
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on encode or I/O failure; the in-memory state is
    /// unaffected
    pub async fn save(&self) -> StoreResult<()> {
        snapshot::write(&self.path, &self.items).await?;
        tracing::debug!("Saved {} items to {}", self.len(), self.path.display());
        Ok(())
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: u32) -> Option<&ItemRecord> {
        self.index.get(&id).map(|&pos| &self.items[pos])
    }

    /// Append a record
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateId` if the id is already stored
    pub fn insert(&mut self, record: ItemRecord) -> StoreResult<()> {
        if self.contains(record.id) {
            return Err(StoreError::DuplicateId { id: record.id });
        }
        self.index.insert(record.id, self.items.len());
        self.items.push(record);
        Ok(())
    }

    /// Update the download flag of a stored record; false if `id` is unknown
    pub fn set_downloaded(&mut self, id: u32, downloaded: bool) -> bool {
        match self.index.get(&id) {
            Some(&pos) => {
                self.items[pos].downloaded = downloaded;
                true
            }
            None => false,
        }
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ItemRecord> {
        self.items.iter()
    }

    /// Records whose artifact has not been downloaded
    pub fn pending(&self) -> impl Iterator<Item = &ItemRecord> {
        self.items.iter().filter(|record| !record.downloaded)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn summary(&self) -> StoreSummary {
        let downloaded = self.items.iter().filter(|r| r.downloaded).count();
        StoreSummary {
            total: self.items.len(),
            downloaded,
            pending: self.items.len() - downloaded,
        }
    }
}
