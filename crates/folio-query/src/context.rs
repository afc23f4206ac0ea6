//! Source-line context for query hits.

use std::collections::BTreeMap;

use folio_types::Position;

/// ANSI magenta on / reset
const ANSI_OPEN: &str = "\x1b[35m";
const ANSI_CLOSE: &str = "\x1b[0m";

/// One source line containing a hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLine {
    pub line: u32,
    /// Line text with matching tokens highlighted
    pub text: String,
    /// Word indexes of the hit on this line, ascending
    pub word_indexes: Vec<u32>,
}

/// Wraps matching tokens in a line with open/close markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighter {
    open: String,
    close: String,
}

impl Highlighter {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Terminal color highlighting
    pub fn ansi() -> Self {
        Self::new(ANSI_OPEN, ANSI_CLOSE)
    }

    /// No markers; lines are returned as-is
    pub fn plain() -> Self {
        Self::new("", "")
    }

    /// Highlight every whitespace-separated token for which `matches` is
    /// true. Whitespace between tokens is preserved.
    pub fn highlight(&self, line: &str, matches: impl Fn(&str) -> bool) -> String {
        if self.open.is_empty() && self.close.is_empty() {
            return line.to_string();
        }

        let mut out = String::with_capacity(line.len());
        let mut last = 0;
        for (start, end) in token_spans(line) {
            out.push_str(&line[last..start]);
            let token = &line[start..end];
            if matches(token) {
                out.push_str(&self.open);
                out.push_str(token);
                out.push_str(&self.close);
            } else {
                out.push_str(token);
            }
            last = end;
        }
        out.push_str(&line[last..]);
        out
    }
}

/// Byte spans of whitespace-separated tokens.
fn token_spans(line: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (idx, ch) in line.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, idx));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, line.len()));
    }
    spans
}

/// Source lines referenced by `positions`, in line order.
///
/// Lines past the end of `text` are dropped.
pub(crate) fn context_lines(
    text: &str,
    positions: &[Position],
    highlighter: &Highlighter,
    matches: impl Fn(&str) -> bool,
) -> Vec<ContextLine> {
    let mut by_line: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for position in positions {
        by_line
            .entry(position.line)
            .or_default()
            .push(position.word_index);
    }

    let lines: Vec<&str> = text.lines().collect();
    by_line
        .into_iter()
        .filter_map(|(line, mut word_indexes)| {
            let raw = lines.get(line.checked_sub(1)? as usize)?;
            word_indexes.sort_unstable();
            word_indexes.dedup();
            Some(ContextLine {
                line,
                text: highlighter.highlight(raw.trim(), &matches),
                word_indexes,
            })
        })
        .collect()
}
