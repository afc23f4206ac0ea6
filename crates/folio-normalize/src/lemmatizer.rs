//! Pluggable lemmatization.
//!
//! Lemmatizers receive a cleaned, lowercase ASCII word and return its root
//! form. They are constructed once and shared; any expensive setup happens
//! in the constructor, never per call.

use rust_stemmers::{Algorithm, Stemmer};

/// Reduces a cleaned word to its canonical lemma.
pub trait Lemmatizer: Send + Sync {
    /// Lemma for `word`. An empty result discards the token.
    fn lemmatize(&self, word: &str) -> String;

    /// Name of this lemmatizer for logging.
    fn name(&self) -> &str;
}

/// Case-fold only: the lemma is the lowercased word.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseFoldLemmatizer;

impl Lemmatizer for CaseFoldLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        word.to_lowercase()
    }

    fn name(&self) -> &str {
        "case_fold"
    }
}

/// Snowball stemmer ("whales" -> "whale", "swimming" -> "swim").
pub struct StemmingLemmatizer {
    stemmer: Stemmer,
}

impl StemmingLemmatizer {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            stemmer: Stemmer::create(algorithm),
        }
    }

    pub fn english() -> Self {
        Self::new(Algorithm::English)
    }
}

impl std::fmt::Debug for StemmingLemmatizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StemmingLemmatizer").finish_non_exhaustive()
    }
}

impl Lemmatizer for StemmingLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        self.stemmer.stem(&word.to_lowercase()).into_owned()
    }

    fn name(&self) -> &str {
        "english_stemmer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_fold() {
        let lemmatizer = CaseFoldLemmatizer;
        assert_eq!(lemmatizer.lemmatize("Whales"), "whales");
        assert_eq!(lemmatizer.name(), "case_fold");
    }

    #[test]
    fn test_english_stemmer_reduces_inflections() {
        let lemmatizer = StemmingLemmatizer::english();
        assert_eq!(lemmatizer.lemmatize("whales"), "whale");
        assert_eq!(lemmatizer.lemmatize("swimming"), "swim");
        assert_eq!(
            lemmatizer.lemmatize("harpooned"),
            lemmatizer.lemmatize("harpooning")
        );
        assert_eq!(lemmatizer.name(), "english_stemmer");
    }

    #[test]
    fn test_lemmatizers_are_object_safe() {
        let all: Vec<Box<dyn Lemmatizer>> = vec![
            Box::new(CaseFoldLemmatizer),
            Box::new(StemmingLemmatizer::english()),
        ];
        for lemmatizer in &all {
            assert!(!lemmatizer.lemmatize("sea").is_empty());
        }
    }
}
