//! Error types for the folio system.

use thiserror::Error;

/// Unified error type for domain-level operations.
#[derive(Debug, Error)]
pub enum FolioError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A postings record violates one of its counting invariants
    #[error("Invariant violated for '{lemma}': {reason}")]
    Invariant { lemma: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FolioError::Config("missing sentinel".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing sentinel");

        let err = FolioError::Invariant {
            lemma: "whale".to_string(),
            reason: "total 3 != 2".to_string(),
        };
        assert_eq!(err.to_string(), "Invariant violated for 'whale': total 3 != 2");
    }
}
