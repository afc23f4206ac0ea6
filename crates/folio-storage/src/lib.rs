//! Storage layer for folio.
//!
//! Everything lives in plain files under a data directory:
//! - Postings shards, one file per lemma, addressed by
//!   `{first letter}/{first two letters}/{lemma}.{json|tsv}`
//! - One checkpoint file per postings backend (last fully indexed id)
//! - One lemmatizer record per postings backend
//! - A metadata CSV keyed by document id
//! - A directory of `<id>.txt` documents
//!
//! Shard and checkpoint files are replaced atomically (temp file, fsync,
//! rename). Writers assume a single indexer process per data directory;
//! nothing here locks across processes.

pub mod checkpoint;
pub mod documents;
pub mod error;
pub mod flat;
pub mod lemmatizer_record;
pub mod metadata;
pub mod postings;
pub mod shard;
pub mod structured;

pub use checkpoint::{CheckpointStore, FileCheckpointStore};
pub use documents::{DirectorySource, DocumentSource, InMemorySource};
pub use error::StorageError;
pub use flat::{FlatRow, FlatStore, FLAT_HEADER, MAX_LINE_OCCURRENCES};
pub use lemmatizer_record::LemmatizerRecord;
pub use metadata::{append_metadata, CsvMetadataStore, MetadataStore, METADATA_HEADER};
pub use postings::{open_store, MalformedShard, MergeOutcome, PostingsStore, ShardScan};
pub use shard::ShardKey;
pub use structured::{ShardRecord, StructuredStore};
