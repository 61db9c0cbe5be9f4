//! Persistence layer for Pagewalk
//!
//! Two JSON files make up the durable state: the crawl-state snapshot (the
//! four frontier sets) and the per-page metadata map. Both are rewritten
//! whole on each flush by a coalescing [`SnapshotWriter`]; loading happens
//! synchronously at startup.

mod writer;

pub use writer::SnapshotWriter;

use crate::metadata::PageRecord;
use crate::state::CrawlSnapshot;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Storage-specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loads the persisted crawl-state snapshot, if the file exists
///
/// A missing file means a first run, not an error.
pub fn load_snapshot(path: &Path) -> Result<Option<CrawlSnapshot>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let snapshot = serde_json::from_str(&content)?;
    Ok(Some(snapshot))
}

/// Loads the persisted metadata map, if the file exists
pub fn load_metadata(path: &Path) -> Result<Option<HashMap<String, PageRecord>>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let records = serde_json::from_str(&content)?;
    Ok(Some(records))
}
