//! JSON shard backend with exact positions.
//!
//! Record layout:
//! ```json
//! {
//!   "word": "whale",
//!   "total": 3,
//!   "allocations": {
//!     "BookID_1": { "times": 2, "positions": [{"line": 1, "wordIndex": 2}, ...] }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use folio_types::{Allocation, DocumentId, ShardEncoding, WordEntry};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StorageError;
use crate::postings::{ensure_lemma, scan_shards, MergeOutcome, PostingsStore, ShardScan};
use crate::shard::{write_atomic, ShardKey};

/// On-disk form of a structured shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardRecord {
    pub word: String,
    pub total: u64,
    pub allocations: BTreeMap<String, Allocation>,
}

impl From<&WordEntry> for ShardRecord {
    fn from(entry: &WordEntry) -> Self {
        Self {
            word: entry.lemma.clone(),
            total: entry.total,
            allocations: entry
                .allocations
                .iter()
                .map(|(doc, allocation)| (doc.allocation_key(), allocation.clone()))
                .collect(),
        }
    }
}

impl ShardRecord {
    /// Convert to a [`WordEntry`]; `path` is only used for error context.
    ///
    /// Stored counts are checked against the positions: a record whose
    /// `times` or `total` disagree with them is malformed.
    pub fn into_entry(self, path: &Path) -> Result<WordEntry, StorageError> {
        let mut entry = WordEntry::new(self.word);
        for (key, allocation) in self.allocations {
            let doc = DocumentId::from_allocation_key(&key).map_err(|e| {
                StorageError::MalformedRecord {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;
            entry.allocations.insert(doc, allocation);
        }
        entry.total = self.total;
        entry
            .check_invariants()
            .map_err(|e| StorageError::MalformedRecord {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(entry)
    }
}

/// Structured (JSON) postings store.
///
/// Keeps every position. Merge unions positions per document, so `times`
/// always equals the number of distinct positions and re-merging the same
/// document cannot inflate counts.
#[derive(Debug, Clone)]
pub struct StructuredStore {
    root: PathBuf,
}

impl StructuredStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn shard_path(&self, key: &ShardKey) -> PathBuf {
        self.root.join(key.relative_path(ShardEncoding::Structured))
    }

    /// Read and decode one shard file.
    fn decode(path: &Path) -> Result<WordEntry, StorageError> {
        let bytes = fs::read(path).map_err(|source| StorageError::ShardIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode_bytes(path, &bytes)
    }

    fn decode_bytes(path: &Path, bytes: &[u8]) -> Result<WordEntry, StorageError> {
        let record: ShardRecord =
            serde_json::from_slice(bytes).map_err(|e| StorageError::MalformedRecord {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let key = ShardKey::from_path(path).map_err(|e| StorageError::MalformedRecord {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if record.word != key.lemma() {
            return Err(StorageError::MalformedRecord {
                path: path.to_path_buf(),
                reason: format!("record word '{}' does not match shard name", record.word),
            });
        }
        record.into_entry(path)
    }

    fn read_existing(&self, path: &Path) -> Result<Option<WordEntry>, StorageError> {
        match fs::read(path) {
            Ok(bytes) => Self::decode_bytes(path, &bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::ShardIo {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl PostingsStore for StructuredStore {
    fn encoding(&self) -> ShardEncoding {
        ShardEncoding::Structured
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn get(&self, lemma: &str) -> Result<Option<WordEntry>, StorageError> {
        let key = ShardKey::new(lemma)?;
        self.read_existing(&self.shard_path(&key))
    }

    fn merge(&self, lemma: &str, incoming: &WordEntry) -> Result<MergeOutcome, StorageError> {
        ensure_lemma(lemma, incoming)?;
        let key = ShardKey::new(lemma)?;
        let path = self.shard_path(&key);

        let (mut stored, existed) = match self.read_existing(&path)? {
            Some(entry) => (entry, true),
            None => (WordEntry::new(lemma), false),
        };

        let changed = stored.merge(incoming);
        if existed && !changed {
            return Ok(MergeOutcome::Unchanged);
        }

        let bytes = serde_json::to_vec_pretty(&ShardRecord::from(&stored))?;
        write_atomic(&path, &bytes).map_err(|source| StorageError::ShardIo {
            path: path.clone(),
            source,
        })?;
        debug!(lemma, total = stored.total, documents = stored.allocations.len(), "Merged structured shard");

        Ok(if existed {
            MergeOutcome::Updated
        } else {
            MergeOutcome::Created
        })
    }

    fn scan(&self) -> Result<ShardScan, StorageError> {
        scan_shards(&self.root, ShardEncoding::Structured, Self::decode)
    }
}
