//! Per-document outcomes and the run report.

use folio_storage::MergeOutcome;
use folio_types::{DocumentId, ShardEncoding};

/// What merging one document did to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSummary {
    pub lemmas: usize,
    pub occurrences: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl DocumentSummary {
    /// Count one shard merge.
    pub fn record_merge(&mut self, outcome: MergeOutcome) {
        self.lemmas += 1;
        match outcome {
            MergeOutcome::Created => self.created += 1,
            MergeOutcome::Updated => self.updated += 1,
            MergeOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Result of processing one document.
///
/// Fatal failures are `Err(IndexingError)`; everything here lets the run
/// keep going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Every lemma of the document was merged
    Indexed {
        id: DocumentId,
        summary: DocumentSummary,
    },
    /// The document could not be read; nothing was merged
    Skipped { id: DocumentId, reason: String },
}

impl DocumentOutcome {
    pub fn id(&self) -> DocumentId {
        match self {
            DocumentOutcome::Indexed { id, .. } | DocumentOutcome::Skipped { id, .. } => *id,
        }
    }
}

/// Summary of one builder run against one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub encoding: ShardEncoding,
    /// Checkpoint read at the start of the run
    pub start_checkpoint: u64,
    /// Checkpoint after the run
    pub checkpoint: u64,
    /// Documents fully merged
    pub indexed: usize,
    /// Documents that could not be read
    pub skipped: Vec<DocumentId>,
    /// Shard merges by outcome
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Lemma occurrences recorded across indexed documents
    pub occurrences: usize,
    /// Run stopped at a skipped document instead of continuing
    pub stopped_early: bool,
}

impl BuildReport {
    pub fn new(encoding: ShardEncoding, start_checkpoint: u64) -> Self {
        Self {
            encoding,
            start_checkpoint,
            checkpoint: start_checkpoint,
            indexed: 0,
            skipped: Vec::new(),
            created: 0,
            updated: 0,
            unchanged: 0,
            occurrences: 0,
            stopped_early: false,
        }
    }

    /// Record a document whose lemmas were all merged.
    pub fn record_indexed(&mut self, summary: &DocumentSummary) {
        self.indexed += 1;
        self.created += summary.created;
        self.updated += summary.updated;
        self.unchanged += summary.unchanged;
        self.occurrences += summary.occurrences;
    }

    pub fn record_skip(&mut self, id: DocumentId) {
        self.skipped.push(id);
    }

    /// Check if any shard content changed.
    pub fn has_updates(&self) -> bool {
        self.created + self.updated > 0
    }

    /// Documents handled (indexed + skipped).
    pub fn total(&self) -> usize {
        self.indexed + self.skipped.len()
    }
}
