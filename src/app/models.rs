//! Data models for the e-book fetcher
//!
//! This module defines the catalog item record and the scraped metadata it is
//! built from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Metadata scraped from one catalog item page
///
/// All values are already trimmed; `title` and `publisher` are sanitized and
/// `format` is lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMetadata {
    pub title: String,
    pub description: String,
    pub publisher: String,
    pub author: String,
    pub isbn: String,
    pub date_published: String,
    pub page_count: String,
    pub language: String,
    pub format: String,
    pub download_url: String,
}

/// One discovered catalog entry
///
/// `file_name` and `save_path` are derived from the metadata when the record
/// is created and stored verbatim so that the snapshot carries them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: u32,
    pub source_url: String,
    pub title: String,
    pub description: String,
    pub publisher: String,
    pub author: String,
    pub isbn: String,
    pub date_published: String,
    pub page_count: String,
    pub language: String,
    pub format: String,
    pub download_url: String,
    pub file_name: String,
    /// Relative path with `/` separators: `{publisher}/{title}/{file_name}`
    pub save_path: String,
    pub downloaded: bool,
}

impl ItemRecord {
    /// Build a record from scraped metadata; `downloaded` starts out false
    pub fn new(id: u32, source_url: impl Into<String>, meta: ItemMetadata) -> Self {
        let file_name = file_name_for(&meta.title, &meta.format);
        let save_path = format!("{}/{}/{}", meta.publisher, meta.title, file_name);

        Self {
            id,
            source_url: source_url.into(),
            title: meta.title,
            description: meta.description,
            publisher: meta.publisher,
            author: meta.author,
            isbn: meta.isbn,
            date_published: meta.date_published,
            page_count: meta.page_count,
            language: meta.language,
            format: meta.format,
            download_url: meta.download_url,
            file_name,
            save_path,
            downloaded: false,
        }
    }

    /// Absolute (or root-relative) location of the artifact on disk
    pub fn local_path(&self, storage_root: &Path) -> PathBuf {
        let mut path = storage_root.to_path_buf();
        for segment in self.save_path.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }

    /// Short label used in progress and log output
    pub fn label(&self) -> String {
        format!("#{} {}", self.id, self.title)
    }
}

/// `{title}.{format}`
pub fn file_name_for(title: &str, format: &str) -> String {
    format!("{}.{}", title, format)
}

#[cfg(test)]
pub(crate) fn sample_metadata(title: &str) -> ItemMetadata {
    ItemMetadata {
        title: title.to_string(),
        description: "A book about things".to_string(),
        publisher: "OReilly Media".to_string(),
        author: "Jane Doe".to_string(),
        isbn: "978-1-4493-1234-5".to_string(),
        date_published: "2013".to_string(),
        page_count: "320".to_string(),
        language: "English".to_string(),
        format: "pdf".to_string(),
        download_url: "http://filepi.com/i/abc123".to_string(),
    }
}
