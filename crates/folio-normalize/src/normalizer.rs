//! Token -> lemma normalization shared by indexing and querying.

use std::sync::Arc;

use folio_types::LemmatizerKind;
use tracing::trace;

use crate::cleaner::{clean, is_reserved, Rejection};
use crate::lemmatizer::{CaseFoldLemmatizer, Lemmatizer, StemmingLemmatizer};

/// Cleans a raw token and lemmatizes it.
///
/// Output is either a non-empty lowercase ASCII-letter lemma or a
/// [`Rejection`]. Cheap to clone; the lemmatizer is shared.
#[derive(Clone)]
pub struct Normalizer {
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl Normalizer {
    pub fn new(lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self { lemmatizer }
    }

    /// Normalizer with the case-fold lemmatizer.
    pub fn case_fold() -> Self {
        Self::new(Arc::new(CaseFoldLemmatizer))
    }

    /// Normalizer for a configured lemmatizer kind.
    pub fn from_kind(kind: LemmatizerKind) -> Self {
        match kind {
            LemmatizerKind::CaseFold => Self::case_fold(),
            LemmatizerKind::EnglishStemmer => Self::new(Arc::new(StemmingLemmatizer::english())),
        }
    }

    /// Name of the underlying lemmatizer
    pub fn lemmatizer_name(&self) -> &str {
        self.lemmatizer.name()
    }

    /// Normalize a raw token, reporting why it was discarded.
    pub fn analyze(&self, raw: &str) -> Result<String, Rejection> {
        let word = clean(raw)?;
        let lemma: String = self
            .lemmatizer
            .lemmatize(&word)
            .chars()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_lowercase())
            .collect();

        if lemma.is_empty() {
            return Err(Rejection::NoLetters);
        }
        // The lemmatizer may map onto a reserved name ("cons" -> "con").
        if is_reserved(&lemma) {
            return Err(Rejection::Reserved);
        }
        Ok(lemma)
    }

    /// Normalize a raw token; `None` means the token is discarded.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        match self.analyze(raw) {
            Ok(lemma) => Some(lemma),
            Err(reason) => {
                trace!(token = raw, reason = %reason, "Token rejected");
                None
            }
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::case_fold()
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("lemmatizer", &self.lemmatizer.name())
            .finish()
    }
}
