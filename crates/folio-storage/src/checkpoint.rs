//! Persistent indexing cursor.
//!
//! The checkpoint is the id of the highest document whose postings are
//! fully merged. It is stored as a single base-10 integer in a text file,
//! one file per postings backend.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::shard::write_atomic;

/// Durable store for the last fully indexed document id.
pub trait CheckpointStore: Send + Sync {
    /// Last durably written id, or 0 when nothing has been indexed.
    ///
    /// Never fails: absent or unparsable storage reads as 0.
    fn read(&self) -> u64;

    /// Durably record `id` as the new cursor. Must not move backwards.
    fn write(&self, id: u64) -> Result<(), StorageError>;
}

/// Checkpoint kept in a plain text file, replaced atomically on write.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Option<u64>, std::io::Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        match raw.trim().parse::<u64>() {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                warn!(path = ?self.path, content = raw.trim(), error = %e, "Unparsable checkpoint, treating as 0");
                Ok(None)
            }
        }
    }

    fn persist(&self, id: u64) -> Result<(), StorageError> {
        write_atomic(&self.path, id.to_string().as_bytes()).map_err(|source| {
            StorageError::CheckpointIo {
                path: self.path.clone(),
                source,
            }
        })
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn read(&self) -> u64 {
        match self.load() {
            Ok(Some(id)) => id,
            Ok(None) => {
                info!(path = ?self.path, "Initializing checkpoint at 0");
                if let Err(e) = self.persist(0) {
                    warn!(error = %e, "Failed to initialize checkpoint");
                }
                0
            }
            // Unreadable but present: report 0 without clobbering it.
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Checkpoint unreadable, treating as 0");
                0
            }
        }
    }

    fn write(&self, id: u64) -> Result<(), StorageError> {
        let stored = self.load().ok().flatten().unwrap_or(0);
        if id < stored {
            return Err(StorageError::CheckpointRegression {
                stored,
                attempted: id,
            });
        }
        self.persist(id)?;
        debug!(path = ?self.path, id, "Checkpoint written");
        Ok(())
    }
}
