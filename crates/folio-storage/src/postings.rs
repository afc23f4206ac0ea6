//! Postings store abstraction.
//!
//! Two on-disk encodings implement [`PostingsStore`]:
//! - [`StructuredStore`]: one JSON record per lemma with exact positions
//! - [`FlatStore`]: one TSV table per lemma with per-line counts
//!
//! Both merge idempotently but do not store the same information; see the
//! type docs for what each one keeps.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use folio_types::{ShardEncoding, WordEntry};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::StorageError;
use crate::flat::FlatStore;
use crate::structured::StructuredStore;

/// Result of merging one incoming entry into a shard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No shard existed for the lemma
    Created,
    /// The shard existed and its content changed
    Updated,
    /// The shard already contained everything incoming carried
    Unchanged,
}

/// A shard that could not be decoded during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedShard {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything a full scan of a backend root produced.
#[derive(Debug, Default)]
pub struct ShardScan {
    pub entries: Vec<WordEntry>,
    /// Records that failed to parse and were skipped
    pub malformed: Vec<MalformedShard>,
}

/// Keyed store of per-lemma postings.
pub trait PostingsStore: Send + Sync {
    /// Encoding of the shard files
    fn encoding(&self) -> ShardEncoding;

    /// Directory the shard tree lives under
    fn root(&self) -> &Path;

    /// Stored entry for `lemma`, or `None` if no shard exists.
    fn get(&self, lemma: &str) -> Result<Option<WordEntry>, StorageError>;

    /// Merge `incoming` into the shard for `lemma`, creating it if absent.
    ///
    /// Merging the same incoming entry twice leaves the shard unchanged.
    /// An existing shard that cannot be decoded is left untouched and
    /// reported as [`StorageError::MalformedRecord`].
    fn merge(&self, lemma: &str, incoming: &WordEntry) -> Result<MergeOutcome, StorageError>;

    /// Decode every shard under the root, skipping malformed ones.
    fn scan(&self) -> Result<ShardScan, StorageError>;

    /// Number of shard files under the root (0 if the root does not exist)
    fn shard_count(&self) -> usize {
        if !self.root().is_dir() {
            return 0;
        }
        shard_files(self.root(), self.encoding())
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(root = ?self.root(), error = %e, "Skipping unreadable shard directory entry");
                    None
                }
            })
            .count()
    }
}

/// Open the store for `encoding` rooted at `root`.
pub fn open_store(encoding: ShardEncoding, root: impl Into<PathBuf>) -> Arc<dyn PostingsStore> {
    match encoding {
        ShardEncoding::Structured => Arc::new(StructuredStore::new(root)),
        ShardEncoding::Flat => Arc::new(FlatStore::new(root)),
    }
}

/// Shard files for `encoding` below `root`, in path order. Entries the walk
/// could not read are yielded as errors.
pub(crate) fn shard_files(
    root: &Path,
    encoding: ShardEncoding,
) -> impl Iterator<Item = Result<PathBuf, walkdir::Error>> {
    let extension = encoding.extension();
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => {
                let is_shard = entry.file_type().is_file()
                    && entry.path().extension().and_then(|e| e.to_str()) == Some(extension);
                is_shard.then(|| Ok(entry.into_path()))
            }
            Err(e) => Some(Err(e)),
        })
}

/// Walk a backend root and decode each shard with `decode`.
///
/// Malformed shards are logged and collected; I/O failures abort the scan.
pub(crate) fn scan_shards<F>(
    root: &Path,
    encoding: ShardEncoding,
    decode: F,
) -> Result<ShardScan, StorageError>
where
    F: Fn(&Path) -> Result<WordEntry, StorageError>,
{
    if !root.is_dir() {
        return Err(StorageError::IndexRootMissing(root.to_path_buf()));
    }

    let mut scan = ShardScan::default();
    for path in shard_files(root, encoding) {
        // An unreadable subtree hides its shards; report it like a bad shard
        let path = match path {
            Ok(path) => path,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                warn!(path = ?path, error = %e, "Skipping unreadable part of the shard tree");
                scan.malformed.push(MalformedShard {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        match decode(&path) {
            Ok(entry) => scan.entries.push(entry),
            Err(StorageError::MalformedRecord { path, reason }) => {
                warn!(path = ?path, reason = %reason, "Skipping malformed shard");
                scan.malformed.push(MalformedShard { path, reason });
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        root = ?root,
        encoding = %encoding,
        entries = scan.entries.len(),
        malformed = scan.malformed.len(),
        "Shard scan complete"
    );
    Ok(scan)
}

/// Reject an entry whose lemma differs from the shard it is merged into.
pub(crate) fn ensure_lemma(lemma: &str, incoming: &WordEntry) -> Result<(), StorageError> {
    if incoming.lemma != lemma {
        return Err(StorageError::LemmaMismatch {
            expected: lemma.to_string(),
            actual: incoming.lemma.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::{DocumentId, Position};
    use tempfile::TempDir;

    fn entry(lemma: &str, doc: u64, line: u32, word: u32) -> WordEntry {
        let mut entry = WordEntry::new(lemma);
        entry.record(DocumentId::new(doc).unwrap(), Position::new(line, word));
        entry
    }

    #[test]
    fn test_open_store_dispatches_on_encoding() {
        let dir = TempDir::new().unwrap();
        for encoding in [ShardEncoding::Structured, ShardEncoding::Flat] {
            let store = open_store(encoding, dir.path().join(encoding.dir_name()));
            assert_eq!(store.encoding(), encoding);
            assert_eq!(store.shard_count(), 0);

            store.merge("whale", &entry("whale", 1, 1, 2)).unwrap();
            store.merge("sea", &entry("sea", 1, 2, 1)).unwrap();
            assert_eq!(store.shard_count(), 2);
        }
    }

    #[test]
    fn test_scan_missing_root() {
        let dir = TempDir::new().unwrap();
        let store = open_store(ShardEncoding::Structured, dir.path().join("nope"));
        let err = store.scan().unwrap_err();
        assert!(matches!(err, StorageError::IndexRootMissing(_)));
    }

    #[test]
    fn test_lemma_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        for encoding in [ShardEncoding::Structured, ShardEncoding::Flat] {
            let store = open_store(encoding, dir.path().join(encoding.dir_name()));
            let err = store.merge("whale", &entry("sea", 1, 1, 1)).unwrap_err();
            assert!(matches!(err, StorageError::LemmaMismatch { .. }));
        }
    }

    #[test]
    fn test_scan_ignores_stray_files() {
        let dir = TempDir::new().unwrap();
        let store = open_store(ShardEncoding::Structured, dir.path());
        store.merge("whale", &entry("whale", 1, 1, 2)).unwrap();
        std::fs::write(dir.path().join("w").join("wh").join(".tmp123"), "junk").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "junk").unwrap();

        let scan = store.scan().unwrap();
        assert_eq!(scan.entries.len(), 1);
        assert!(scan.malformed.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subtree_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = open_store(ShardEncoding::Flat, dir.path());
        store.merge("whale", &entry("whale", 1, 1, 2)).unwrap();
        store.merge("sea", &entry("sea", 1, 2, 1)).unwrap();

        let locked = dir.path().join("s");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        let readable_anyway = std::fs::read_dir(&locked).is_ok();

        let scan = store.scan();
        let count = store.shard_count();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Permission bits do not stop a privileged user
        if readable_anyway {
            return;
        }
        let scan = scan.unwrap();
        assert_eq!(scan.entries.len(), 1);
        assert_eq!(scan.entries[0].lemma, "whale");
        assert_eq!(scan.malformed.len(), 1);
        assert_eq!(scan.malformed[0].path, locked);
        assert_eq!(count, 1);
    }
}
