//! Query engine over a loaded postings backend.
//!
//! The engine reads every shard once at load time and answers lookups from
//! memory. It does not see shards written after `load`.

pub mod context;
pub mod engine;
pub mod error;

pub use context::{ContextLine, Highlighter};
pub use engine::{LoadStats, QueryEngine, QueryHit};
pub use error::QueryError;
