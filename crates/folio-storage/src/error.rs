//! Storage layer error types.

use std::path::PathBuf;

use folio_types::DocumentId;
use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing a postings shard failed
    #[error("Shard I/O error at {path:?}: {source}")]
    ShardIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The checkpoint could not be persisted
    #[error("Checkpoint I/O error at {path:?}: {source}")]
    CheckpointIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The lemmatizer record could not be read or written
    #[error("Lemmatizer record I/O error at {path:?}: {source}")]
    LemmatizerRecordIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A checkpoint write would move the cursor backwards
    #[error("Checkpoint regression: stored {stored}, attempted {attempted}")]
    CheckpointRegression { stored: u64, attempted: u64 },

    /// A shard or metadata record could not be parsed
    #[error("Malformed record in {path:?}: {reason}")]
    MalformedRecord { path: PathBuf, reason: String },

    /// Postings root is absent or not a directory
    #[error("Index root missing or not a directory: {0:?}")]
    IndexRootMissing(PathBuf),

    /// A single document could not be read
    #[error("Cannot read document {id}: {reason}")]
    DocumentRead { id: DocumentId, reason: String },

    /// The document source itself could not be listed
    #[error("Document source unavailable at {path:?}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Metadata file I/O failed
    #[error("Metadata I/O error at {path:?}: {source}")]
    MetadataIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Lemma cannot be used as a shard key
    #[error("Invalid lemma for shard addressing: '{0}'")]
    InvalidLemma(String),

    /// `merge` was called with an entry for a different lemma
    #[error("Lemma mismatch: shard '{expected}', entry '{actual}'")]
    LemmaMismatch { expected: String, actual: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// True for errors that come from unreadable on-disk content rather than
    /// failed I/O.
    pub fn is_malformed(&self) -> bool {
        matches!(self, StorageError::MalformedRecord { .. })
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for StorageError {
    fn from(err: csv::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::CheckpointRegression {
            stored: 12,
            attempted: 3,
        };
        assert_eq!(err.to_string(), "Checkpoint regression: stored 12, attempted 3");

        let err = StorageError::InvalidLemma("../etc".to_string());
        assert_eq!(err.to_string(), "Invalid lemma for shard addressing: '../etc'");
    }

    #[test]
    fn test_is_malformed() {
        let err = StorageError::MalformedRecord {
            path: PathBuf::from("w/wh/whale.json"),
            reason: "eof".to_string(),
        };
        assert!(err.is_malformed());
        assert!(!StorageError::Serialization("x".to_string()).is_malformed());
    }
}
