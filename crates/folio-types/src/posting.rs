//! Postings records: where and how often a lemma occurs.
//!
//! A [`WordEntry`] is the logical content of one shard. Merging is a set
//! union over positions per document, so applying the same incoming entry
//! twice leaves the stored entry unchanged.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::document::DocumentId;
use crate::error::FolioError;

/// 1-based coordinates of one token occurrence inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub line: u32,
    pub word_index: u32,
}

impl Position {
    pub fn new(line: u32, word_index: u32) -> Self {
        Self { line, word_index }
    }
}

/// Occurrences of one lemma inside one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Occurrence count. Equals `positions.len()` after any merge.
    pub times: u32,
    /// Unique positions of the occurrences
    pub positions: BTreeSet<Position>,
}

impl Allocation {
    /// Build an allocation whose count matches its position set.
    pub fn from_positions(positions: impl IntoIterator<Item = Position>) -> Self {
        let positions: BTreeSet<Position> = positions.into_iter().collect();
        Self {
            times: positions.len() as u32,
            positions,
        }
    }

    /// Union `other`'s positions into this allocation and recount.
    ///
    /// Returns true if the allocation changed.
    pub fn union(&mut self, other: &Allocation) -> bool {
        let before = (self.times, self.positions.len());
        self.positions.extend(other.positions.iter().copied());
        self.times = self.positions.len() as u32;
        before != (self.times, self.positions.len())
    }

    /// Occurrences grouped by line, ascending.
    pub fn per_line_counts(&self) -> BTreeMap<u32, u32> {
        let mut counts = BTreeMap::new();
        for position in &self.positions {
            *counts.entry(position.line).or_insert(0) += 1;
        }
        counts
    }
}

/// Postings record for one lemma across all documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    pub lemma: String,
    /// Sum of `times` over every allocation
    pub total: u64,
    pub allocations: BTreeMap<DocumentId, Allocation>,
}

impl WordEntry {
    /// Create an empty entry for a lemma
    pub fn new(lemma: impl Into<String>) -> Self {
        Self {
            lemma: lemma.into(),
            total: 0,
            allocations: BTreeMap::new(),
        }
    }

    /// Record one occurrence seen while scanning a document.
    ///
    /// Counts every call, so `times` tracks raw occurrences until the entry
    /// is merged into a store.
    pub fn record(&mut self, document: DocumentId, position: Position) {
        let allocation = self.allocations.entry(document).or_default();
        allocation.positions.insert(position);
        allocation.times += 1;
        self.total += 1;
    }

    /// Merge an incoming entry into this one.
    ///
    /// Positions are unioned per document, each touched allocation is
    /// recounted from its position set, and `total` is recomputed from all
    /// allocations. Returns true if the stored state changed.
    pub fn merge(&mut self, incoming: &WordEntry) -> bool {
        let mut changed = false;
        for (document, allocation) in &incoming.allocations {
            match self.allocations.get_mut(document) {
                Some(existing) => changed |= existing.union(allocation),
                None => {
                    let fresh = Allocation::from_positions(allocation.positions.iter().copied());
                    self.allocations.insert(*document, fresh);
                    changed = true;
                }
            }
        }
        let total = self.recount_total();
        changed |= total != self.total;
        self.total = total;
        changed
    }

    /// Sum of `times` over every allocation
    pub fn recount_total(&self) -> u64 {
        self.allocations.values().map(|a| u64::from(a.times)).sum()
    }

    /// Allocation for one document, if the lemma occurs there
    pub fn allocation(&self, document: DocumentId) -> Option<&Allocation> {
        self.allocations.get(&document)
    }

    /// Verify `total == Σ times` and `times == |positions|` for every document.
    pub fn check_invariants(&self) -> Result<(), FolioError> {
        if self.lemma.is_empty() {
            return Err(FolioError::Invariant {
                lemma: String::new(),
                reason: "empty lemma".to_string(),
            });
        }
        for (document, allocation) in &self.allocations {
            if allocation.times as usize != allocation.positions.len() {
                return Err(FolioError::Invariant {
                    lemma: self.lemma.clone(),
                    reason: format!(
                        "document {} has times {} but {} unique positions",
                        document,
                        allocation.times,
                        allocation.positions.len()
                    ),
                });
            }
        }
        let sum = self.recount_total();
        if sum != self.total {
            return Err(FolioError::Invariant {
                lemma: self.lemma.clone(),
                reason: format!("total {} != sum of times {}", self.total, sum),
            });
        }
        Ok(())
    }
}
