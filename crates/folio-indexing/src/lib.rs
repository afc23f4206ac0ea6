//! Incremental index builder.
//!
//! Reads documents with ids above the stored checkpoint, in ascending id
//! order, and merges each document's postings into a [`PostingsStore`].
//! The checkpoint only advances once every lemma of a document is merged,
//! so an interrupted run resumes by re-merging (idempotently) the document
//! it stopped in.
//!
//! One builder run per backend: structured and flat stores keep separate
//! checkpoints.
//!
//! [`PostingsStore`]: folio_storage::PostingsStore

pub mod builder;
pub mod error;
pub mod report;

pub use builder::{IndexBuilder, IndexerConfig};
pub use error::IndexingError;
pub use report::{BuildReport, DocumentOutcome, DocumentSummary};
