//! JSON snapshot encoding and atomic persistence
//!
//! The snapshot is written next to its final location and renamed over it,
//! so a reader only ever sees the previous or the new complete file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::app::models::ItemRecord;
use crate::app::path::temp_path_for;
use crate::constants::files;
use crate::errors::{StoreError, StoreResult};

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    items: &'a [ItemRecord],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    items: Vec<ItemRecord>,
}

/// Encode records in insertion order
pub fn encode(items: &[ItemRecord]) -> StoreResult<Vec<u8>> {
    let snapshot = SnapshotRef {
        version: files::SNAPSHOT_VERSION,
        items,
    };
    Ok(serde_json::to_vec_pretty(&snapshot)?)
}

/// Decode a snapshot read from `path`
pub fn decode(path: &Path, bytes: &[u8]) -> StoreResult<Vec<ItemRecord>> {
    let snapshot: Snapshot = serde_json::from_slice(bytes).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    if snapshot.version != files::SNAPSHOT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: snapshot.version,
            expected: files::SNAPSHOT_VERSION,
        });
    }

    Ok(snapshot.items)
}

/// Read the snapshot at `path`; `None` if there is none yet
pub async fn read(path: &Path) -> StoreResult<Option<Vec<ItemRecord>>> {
    match fs::read(path).await {
        Ok(bytes) => decode(path, &bytes).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Atomically replace the snapshot at `path`
pub async fn write(path: &Path, items: &[ItemRecord]) -> StoreResult<()> {
    let bytes = encode(items)?;
    let temp_path = temp_path_for(path);
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }
    }

    let mut file = File::create(&temp_path).await.map_err(io_err)?;
    file.write_all(&bytes).await.map_err(io_err)?;
    file.sync_all().await.map_err(io_err)?;
    drop(file);

    fs::rename(&temp_path, path).await.map_err(io_err)?;
    Ok(())
}
