//! Document sources: where raw text comes from.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use folio_types::DocumentId;
use tracing::debug;

use crate::error::StorageError;

/// Provides document ids and their text.
pub trait DocumentSource: Send + Sync {
    /// Every available document id, ascending.
    fn list(&self) -> Result<Vec<DocumentId>, StorageError>;

    /// Full text of one document.
    fn read(&self, id: DocumentId) -> Result<String, StorageError>;
}

/// Directory of `<id>.txt` files.
///
/// Files whose stem is not the canonical decimal form of a positive id
/// (`7.txt`, not `007.txt`) are ignored.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding document `id`
    pub fn path_for(&self, id: DocumentId) -> PathBuf {
        self.root.join(format!("{}.txt", id))
    }

    fn id_from_path(path: &Path) -> Option<DocumentId> {
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let id: DocumentId = stem.parse().ok()?;
        // read() opens path_for(id), so only the canonical spelling is listable
        (id.to_string() == stem).then_some(id)
    }
}

impl DocumentSource for DirectorySource {
    fn list(&self) -> Result<Vec<DocumentId>, StorageError> {
        let unavailable = |source| StorageError::SourceUnavailable {
            path: self.root.clone(),
            source,
        };

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(unavailable)? {
            let entry = entry.map_err(unavailable)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match Self::id_from_path(&path) {
                Some(id) => ids.push(id),
                None => debug!(path = ?path, "Ignoring non-document file"),
            }
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn read(&self, id: DocumentId) -> Result<String, StorageError> {
        let path = self.path_for(id);
        let bytes = fs::read(&path).map_err(|e| StorageError::DocumentRead {
            id,
            reason: format!("{}: {}", path.display(), e),
        })?;
        String::from_utf8(bytes).map_err(|e| StorageError::DocumentRead {
            id,
            reason: format!("{} is not valid UTF-8: {}", path.display(), e),
        })
    }
}

/// In-memory documents, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    documents: BTreeMap<DocumentId, String>,
    unreadable: BTreeSet<DocumentId>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document
    pub fn insert(&mut self, id: DocumentId, text: impl Into<String>) {
        self.documents.insert(id, text.into());
    }

    pub fn with_document(mut self, id: DocumentId, text: impl Into<String>) -> Self {
        self.insert(id, text);
        self
    }

    /// List `id` but fail every read of it.
    pub fn mark_unreadable(&mut self, id: DocumentId) {
        self.unreadable.insert(id);
    }

    /// Make a previously unreadable document readable again.
    pub fn mark_readable(&mut self, id: DocumentId) {
        self.unreadable.remove(&id);
    }
}

impl DocumentSource for InMemorySource {
    fn list(&self) -> Result<Vec<DocumentId>, StorageError> {
        let ids: BTreeSet<DocumentId> = self
            .documents
            .keys()
            .chain(self.unreadable.iter())
            .copied()
            .collect();
        Ok(ids.into_iter().collect())
    }

    fn read(&self, id: DocumentId) -> Result<String, StorageError> {
        if self.unreadable.contains(&id) {
            return Err(StorageError::DocumentRead {
                id,
                reason: "marked unreadable".to_string(),
            });
        }
        self.documents
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::DocumentRead {
                id,
                reason: "no such document".to_string(),
            })
    }
}
