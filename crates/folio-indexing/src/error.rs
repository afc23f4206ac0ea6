//! Error types for the index builder.

use folio_storage::StorageError;
use folio_types::DocumentId;
use thiserror::Error;

/// Errors that halt an indexing run
#[derive(Error, Debug)]
pub enum IndexingError {
    /// The document source could not be listed
    #[error("Document source error: {0}")]
    Source(#[source] StorageError),

    /// A shard merge failed; the document stays unindexed
    #[error("Shard error while indexing document {document}: {source}")]
    Shard {
        document: DocumentId,
        source: StorageError,
    },

    /// The checkpoint could not be advanced past a merged document
    #[error("Checkpoint error after document {document}: {source}")]
    Checkpoint {
        document: DocumentId,
        source: StorageError,
    },
}

impl IndexingError {
    /// Document being processed when the run halted, if any
    pub fn document(&self) -> Option<DocumentId> {
        match self {
            IndexingError::Source(_) => None,
            IndexingError::Shard { document, .. } | IndexingError::Checkpoint { document, .. } => {
                Some(*document)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_display() {
        let document = DocumentId::new(4).unwrap();
        let err = IndexingError::Shard {
            document,
            source: StorageError::InvalidLemma("x1".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Shard error while indexing document 4: Invalid lemma for shard addressing: 'x1'"
        );
        assert_eq!(err.document(), Some(document));

        let err = IndexingError::Source(StorageError::IndexRootMissing(PathBuf::from("books")));
        assert_eq!(err.document(), None);
    }
}
