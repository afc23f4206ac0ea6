//! Query engine error types.

use std::path::PathBuf;

use folio_storage::StorageError;
use thiserror::Error;

/// Errors that can occur while loading or querying an index
#[derive(Error, Debug)]
pub enum QueryError {
    /// Postings root is absent or not a directory
    #[error("Index root not found: {0:?} (run `folio index` first)")]
    IndexRootMissing(PathBuf),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
