//! # folio-types
//!
//! Shared domain types for the folio inverted index.
//!
//! - [`DocumentId`] and [`DocumentMetadata`]: what is indexed
//! - [`Position`], [`Allocation`], [`WordEntry`]: postings records and the
//!   idempotent merge that every storage backend relies on
//! - [`ShardEncoding`]: structured (JSON) vs flat (TSV) shard encodings
//! - [`Settings`]: layered configuration

pub mod config;
pub mod document;
pub mod encoding;
pub mod error;
pub mod posting;

pub use config::{BackendSelection, LemmatizerKind, Settings};
pub use document::{DocumentId, DocumentMetadata, ALLOCATION_KEY_PREFIX};
pub use encoding::ShardEncoding;
pub use error::FolioError;
pub use posting::{Allocation, Position, WordEntry};
