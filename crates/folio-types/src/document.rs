//! Document identity and descriptive metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FolioError;

/// Prefix used for per-document keys in structured shard records.
pub const ALLOCATION_KEY_PREFIX: &str = "BookID_";

/// Positive integer identifying one document in the corpus.
///
/// Ordering follows the numeric id, which is also the processing order of
/// the index builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Create a document id. Zero is reserved for "nothing indexed yet".
    pub fn new(id: u64) -> Result<Self, FolioError> {
        if id == 0 {
            return Err(FolioError::InvalidInput(
                "document id must be positive".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Numeric value of the id
    pub fn get(self) -> u64 {
        self.0
    }

    /// Key used for this document inside a structured shard record.
    /// Format: `BookID_{id}`
    pub fn allocation_key(&self) -> String {
        format!("{}{}", ALLOCATION_KEY_PREFIX, self.0)
    }

    /// Parse an allocation key produced by [`DocumentId::allocation_key`].
    pub fn from_allocation_key(key: &str) -> Result<Self, FolioError> {
        let raw = key.strip_prefix(ALLOCATION_KEY_PREFIX).ok_or_else(|| {
            FolioError::InvalidInput(format!("Invalid allocation key format: {}", key))
        })?;
        raw.parse()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: u64 = s
            .trim()
            .parse()
            .map_err(|e| FolioError::InvalidInput(format!("Invalid document id '{}': {}", s, e)))?;
        Self::new(id)
    }
}

/// Descriptive metadata for a document, keyed by its id.
///
/// Column order matches the metadata CSV:
/// `ID,Title,Author,Release Date,Most Recently Updated,Language`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(rename = "ID")]
    pub id: DocumentId,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Author", default)]
    pub author: String,
    #[serde(rename = "Release Date", default)]
    pub release_date: String,
    #[serde(rename = "Most Recently Updated", default)]
    pub updated: String,
    #[serde(rename = "Language", default)]
    pub language: String,
}

impl DocumentMetadata {
    /// Metadata with only an id and a title; other columns empty.
    pub fn new(id: DocumentId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            author: String::new(),
            release_date: String::new(),
            updated: String::new(),
            language: String::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}
