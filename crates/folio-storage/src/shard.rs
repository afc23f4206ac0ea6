//! Shard addressing and atomic file replacement.
//!
//! Path format: `{first}/{prefix}/{lemma}.{ext}`
//! - first: the lemma's first letter
//! - prefix: its first two letters (the first letter alone for one-letter lemmas)
//!
//! The two-level fan-out keeps per-directory file counts small.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use folio_types::ShardEncoding;

use crate::error::StorageError;

/// Validated lemma used to address a shard file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardKey {
    lemma: String,
}

impl ShardKey {
    /// Create a key. The lemma must be non-empty lowercase ASCII letters,
    /// which also rules out path separators and dot segments.
    pub fn new(lemma: &str) -> Result<Self, StorageError> {
        if lemma.is_empty() || !lemma.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(StorageError::InvalidLemma(lemma.to_string()));
        }
        Ok(Self {
            lemma: lemma.to_string(),
        })
    }

    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    /// First letter directory
    pub fn first(&self) -> &str {
        &self.lemma[..1]
    }

    /// Two-letter prefix directory (one letter for single-letter lemmas)
    pub fn prefix(&self) -> &str {
        &self.lemma[..self.lemma.len().min(2)]
    }

    /// Path of the shard relative to a backend root
    pub fn relative_path(&self, encoding: ShardEncoding) -> PathBuf {
        PathBuf::from(self.first())
            .join(self.prefix())
            .join(format!("{}.{}", self.lemma, encoding.extension()))
    }

    /// Recover the key from a shard file path (the file stem).
    pub fn from_path(path: &Path) -> Result<Self, StorageError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| StorageError::InvalidLemma(path.to_string_lossy().to_string()))?;
        Self::new(stem)
    }
}

/// Replace `path` with `bytes`: write a sibling temp file, fsync, rename.
///
/// Readers see either the old or the new content, never a torn file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "shard path has no parent directory")
    })?;
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
