//! Coalescing snapshot writer
//!
//! One writer owns one output file. `save` never blocks the crawl loop: it
//! serializes the snapshot into a single pending slot (latest write wins)
//! and triggers an asynchronous flush. The flush discipline guarantees at
//! most one in-flight write per file and that the file eventually holds the
//! last saved snapshot.

use crate::storage::StorageError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Asynchronous, self-serializing writer for one logical file
pub struct SnapshotWriter {
    inner: Arc<WriterInner>,
}

struct WriterInner {
    path: PathBuf,
    /// The one pending snapshot slot; a newer save overwrites it unconditionally
    pending: Mutex<Option<String>>,
    /// Set while a flush task owns the file
    in_flight: AtomicBool,
}

impl SnapshotWriter {
    /// Creates a writer for the given output file
    ///
    /// Constructed once at startup; the writer owns the file for the life of
    /// the process.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(WriterInner {
                path: path.into(),
                pending: Mutex::new(None),
                in_flight: AtomicBool::new(false),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Records `value` as the snapshot to persist and triggers a flush
    ///
    /// Returns immediately; serialization happens here so the caller's data
    /// can keep mutating, but the disk write is asynchronous. Intermediate
    /// snapshots saved while a write is in flight are coalesced away.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(value)?;
        *self.inner.pending.lock().unwrap() = Some(json);
        WriterInner::try_flush(Arc::clone(&self.inner));
        Ok(())
    }

    /// Waits until no write is in flight and no snapshot is pending
    ///
    /// Called before shutdown so the last completed flush reflects the final
    /// in-memory state.
    pub async fn wait_idle(&self) {
        loop {
            let pending = self.inner.pending.lock().unwrap().is_some();
            if !pending && !self.inner.in_flight.load(Ordering::Acquire) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl WriterInner {
    /// Starts a flush task unless one already owns the file
    fn try_flush(inner: Arc<Self>) {
        if inner.in_flight.swap(true, Ordering::AcqRel) {
            // The running task will pick the pending snapshot up, or the
            // re-check below will respawn after it finishes.
            return;
        }

        tokio::spawn(async move {
            loop {
                let next = inner.pending.lock().unwrap().take();
                let Some(json) = next else { break };

                if let Err(e) = tokio::fs::write(&inner.path, json.as_bytes()).await {
                    tracing::error!("Failed to write {}: {}", inner.path.display(), e);
                }
            }

            inner.in_flight.store(false, Ordering::Release);

            // A save may have landed between the final take and the flag
            // clear; it is owed exactly one more flush.
            if inner.pending.lock().unwrap().is_some() {
                Self::try_flush(inner);
            }
        });
    }
}
