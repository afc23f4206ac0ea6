//! # folio-normalize
//!
//! Turns raw whitespace-separated tokens into index keys (lemmas).
//!
//! The pipeline for one token is:
//! 1. [`clean`]: strip possessives and apostrophes, reject tokens that start
//!    with `_` or contain digits, keep letters only, strip diacritics,
//!    lowercase, reject reserved device names
//! 2. a pluggable [`Lemmatizer`] reduces the cleaned word to its root
//!
//! [`Normalizer`] bundles both steps and is constructed once per process,
//! then shared by the index builder and the query engine.

pub mod cleaner;
pub mod lemmatizer;
pub mod normalizer;
pub mod tokenizer;

pub use cleaner::{clean, is_reserved, Rejection, RESERVED_NAMES};
pub use lemmatizer::{CaseFoldLemmatizer, Lemmatizer, StemmingLemmatizer};
pub use normalizer::Normalizer;
pub use tokenizer::{tokenize, Token};
