//! Line/word tokenization with 1-based positions.

use folio_types::Position;

/// A raw token and where it sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub position: Position,
    pub text: &'a str,
}

/// Split `text` into lines, then whitespace-separated tokens.
///
/// Every raw token gets a word index, including tokens the normalizer will
/// later reject, so positions match what a reader counts in the source.
pub fn tokenize(text: &str) -> impl Iterator<Item = Token<'_>> {
    text.lines().enumerate().flat_map(|(line_idx, line)| {
        line.split_whitespace()
            .enumerate()
            .map(move |(word_idx, word)| Token {
                position: Position::new(line_idx as u32 + 1, word_idx as u32 + 1),
                text: word,
            })
    })
}
