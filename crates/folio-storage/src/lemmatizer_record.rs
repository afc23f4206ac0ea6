//! Which lemmatizer built a backend's shards.
//!
//! Lemmas produced by different lemmatizers live in different key spaces, so
//! a shard tree is only queryable with the lemmatizer that built it. The
//! record is a one-line text file holding the lemmatizer name.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use folio_types::LemmatizerKind;
use tracing::info;

use crate::error::StorageError;
use crate::shard::write_atomic;

/// File-backed record of the lemmatizer one backend was built with.
#[derive(Debug, Clone)]
pub struct LemmatizerRecord {
    path: PathBuf,
}

impl LemmatizerRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recorded lemmatizer, or `None` if nothing has been recorded yet.
    pub fn read(&self) -> Result<Option<LemmatizerKind>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::LemmatizerRecordIo {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        raw.parse::<LemmatizerKind>()
            .map(Some)
            .map_err(|e| StorageError::MalformedRecord {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    /// Record `kind`, replacing the file atomically.
    pub fn write(&self, kind: LemmatizerKind) -> Result<(), StorageError> {
        write_atomic(&self.path, kind.as_str().as_bytes()).map_err(|source| {
            StorageError::LemmatizerRecordIo {
                path: self.path.clone(),
                source,
            }
        })?;
        info!(path = ?self.path, lemmatizer = %kind, "Recorded index lemmatizer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_absent_record_reads_none() {
        let dir = TempDir::new().unwrap();
        let record = LemmatizerRecord::new(dir.path().join("lemmatizer_flat.txt"));
        assert_eq!(record.read().unwrap(), None);
        assert!(!record.path().exists());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let record = LemmatizerRecord::new(dir.path().join("checkpoints").join("lemmatizer.txt"));
        record.write(LemmatizerKind::EnglishStemmer).unwrap();

        assert_eq!(fs::read_to_string(record.path()).unwrap(), "english_stemmer");
        assert_eq!(
            record.read().unwrap(),
            Some(LemmatizerKind::EnglishStemmer)
        );
    }

    #[test]
    fn test_unknown_name_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lemmatizer.txt");
        fs::write(&path, "porter").unwrap();

        let err = LemmatizerRecord::new(&path).read().unwrap_err();
        assert!(err.is_malformed());
    }
}
