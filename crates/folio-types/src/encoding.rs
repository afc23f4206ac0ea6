//! On-disk shard encodings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FolioError;

/// The two interchangeable postings encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardEncoding {
    /// One JSON record per lemma with exact positions
    Structured,
    /// One tab-separated table per lemma with per-line counts
    Flat,
}

impl ShardEncoding {
    /// File extension of a shard in this encoding
    pub fn extension(&self) -> &'static str {
        match self {
            ShardEncoding::Structured => "json",
            ShardEncoding::Flat => "tsv",
        }
    }

    /// Name of the directory (under the index root) holding this encoding
    pub fn dir_name(&self) -> &'static str {
        match self {
            ShardEncoding::Structured => "structured",
            ShardEncoding::Flat => "flat",
        }
    }

    /// Name of the checkpoint file tracking this encoding's builder
    pub fn checkpoint_file_name(&self) -> &'static str {
        match self {
            ShardEncoding::Structured => "last_id_structured.txt",
            ShardEncoding::Flat => "last_id_flat.txt",
        }
    }

    /// Name of the file recording which lemmatizer built this encoding
    pub fn lemmatizer_file_name(&self) -> &'static str {
        match self {
            ShardEncoding::Structured => "lemmatizer_structured.txt",
            ShardEncoding::Flat => "lemmatizer_flat.txt",
        }
    }
}

impl fmt::Display for ShardEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardEncoding::Structured => write!(f, "structured"),
            ShardEncoding::Flat => write!(f, "flat"),
        }
    }
}

impl FromStr for ShardEncoding {
    type Err = FolioError;

    /// Accepts the encoding names and their file extensions.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured" | "json" => Ok(ShardEncoding::Structured),
            "flat" | "tsv" => Ok(ShardEncoding::Flat),
            other => Err(FolioError::InvalidInput(format!(
                "Unknown shard encoding '{}' (expected structured/json or flat/tsv)",
                other
            ))),
        }
    }
}
