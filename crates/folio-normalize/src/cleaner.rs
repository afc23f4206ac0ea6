//! Token cleaning and rejection rules.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Device names that cannot be used as file names on some filesystems.
/// A lemma equal to one of these would produce an unusable shard path.
pub const RESERVED_NAMES: [&str; 22] = [
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Why a token produced no lemma. Rejections are filtering, not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("empty token")]
    Empty,

    #[error("token starts with an underscore")]
    LeadingUnderscore,

    #[error("token contains a digit")]
    ContainsDigit,

    #[error("token has no ASCII letters after folding")]
    NoLetters,

    #[error("token is a reserved device name")]
    Reserved,
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{02BC}' | '`')
}

/// True if `word`, lowercased, is one of [`RESERVED_NAMES`].
pub fn is_reserved(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    RESERVED_NAMES.contains(&lower.as_str())
}

/// Remove a trailing `'s` (any apostrophe form, any case).
fn strip_possessive(token: &str) -> &str {
    let mut chars = token.char_indices().rev();
    match (chars.next(), chars.next()) {
        (Some((_, s)), Some((idx, apostrophe)))
            if s.eq_ignore_ascii_case(&'s') && is_apostrophe(apostrophe) =>
        {
            &token[..idx]
        }
        _ => token,
    }
}

/// Clean one raw token into a lowercase ASCII-letter word.
pub fn clean(raw: &str) -> Result<String, Rejection> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(Rejection::Empty);
    }

    // Trailing punctuation would hide a possessive suffix ("whale's,").
    let token = token.trim_end_matches(|c: char| !c.is_alphanumeric() && !is_apostrophe(c));
    let token = strip_possessive(token);
    let token: String = token.chars().filter(|c| !is_apostrophe(*c)).collect();

    if token.starts_with('_') {
        return Err(Rejection::LeadingUnderscore);
    }
    if token.chars().any(char::is_numeric) {
        return Err(Rejection::ContainsDigit);
    }

    let word: String = token
        .chars()
        .filter(|c| c.is_alphabetic())
        .nfd()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if word.is_empty() {
        return Err(Rejection::NoLetters);
    }
    if is_reserved(&word) {
        return Err(Rejection::Reserved);
    }
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_plain_words() {
        assert_eq!(clean("Whale").unwrap(), "whale");
        assert_eq!(clean("whale,").unwrap(), "whale");
        assert_eq!(clean("\"Call").unwrap(), "call");
        assert_eq!(clean("sea-monster").unwrap(), "seamonster");
    }

    #[test]
    fn test_clean_strips_possessive_and_apostrophes() {
        assert_eq!(clean("Ahab's").unwrap(), "ahab");
        assert_eq!(clean("Ahab\u{2019}s").unwrap(), "ahab");
        assert_eq!(clean("AHAB'S").unwrap(), "ahab");
        assert_eq!(clean("whale's,").unwrap(), "whale");
        assert_eq!(clean("don't").unwrap(), "dont");
        assert_eq!(clean("'tis").unwrap(), "tis");
    }

    #[test]
    fn test_clean_strips_diacritics() {
        assert_eq!(clean("café").unwrap(), "cafe");
        assert_eq!(clean("Ñandú").unwrap(), "nandu");
        assert_eq!(clean("naïve").unwrap(), "naive");
    }

    #[test]
    fn test_clean_rejections() {
        assert_eq!(clean(""), Err(Rejection::Empty));
        assert_eq!(clean("   "), Err(Rejection::Empty));
        assert_eq!(clean("_italic_"), Err(Rejection::LeadingUnderscore));
        assert_eq!(clean("1851"), Err(Rejection::ContainsDigit));
        assert_eq!(clean("chapter7"), Err(Rejection::ContainsDigit));
        assert_eq!(clean("--"), Err(Rejection::NoLetters));
        assert_eq!(clean("日本"), Err(Rejection::NoLetters));
    }

    #[test]
    fn test_reserved_names_rejected_in_any_case_and_punctuation() {
        for name in RESERVED_NAMES {
            let upper = name.to_uppercase();
            for raw in [
                name.to_string(),
                upper.clone(),
                format!("({})", name),
                format!("{}.", upper),
                format!("\"{}\",", name),
            ] {
                assert!(clean(&raw).is_err(), "{} should be rejected", raw);
            }
        }
        assert_eq!(clean("Con,"), Err(Rejection::Reserved));
        assert_eq!(clean("(AUX)"), Err(Rejection::Reserved));
        assert_eq!(clean("nul's"), Err(Rejection::Reserved));
    }

    #[test]
    fn test_near_reserved_words_pass() {
        assert_eq!(clean("cons").unwrap(), "cons");
        assert_eq!(clean("auxiliary").unwrap(), "auxiliary");
        assert_eq!(clean("null").unwrap(), "null");
    }
}
