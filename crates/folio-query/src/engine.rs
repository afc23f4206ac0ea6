//! Exact-lemma lookups over an in-memory postings snapshot.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use folio_normalize::Normalizer;
use folio_storage::{DocumentSource, MalformedShard, MetadataStore, PostingsStore, StorageError};
use folio_types::{DocumentId, DocumentMetadata, Position, ShardEncoding, WordEntry};
use tracing::{debug, info, warn};

use crate::context::{context_lines, ContextLine, Highlighter};
use crate::error::QueryError;

/// One document matching a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryHit {
    pub document_id: DocumentId,
    /// Occurrences of the lemma in this document
    pub total_occurrences: u32,
    /// Occurrence positions, ascending. Approximate for the flat backend.
    pub positions: Vec<Position>,
    pub metadata: Option<DocumentMetadata>,
}

/// What `load` read.
#[derive(Debug, Clone)]
pub struct LoadStats {
    pub encoding: ShardEncoding,
    pub lemmas: usize,
    /// Distinct documents referenced by any lemma
    pub documents: usize,
    pub metadata_records: usize,
    /// Shards skipped because they could not be parsed
    pub malformed: Vec<MalformedShard>,
}

/// Read-only query engine over one postings backend.
pub struct QueryEngine {
    index: HashMap<String, WordEntry>,
    metadata: Arc<dyn MetadataStore>,
    normalizer: Normalizer,
    stats: LoadStats,
}

impl QueryEngine {
    /// Load every shard of `store` into memory.
    ///
    /// Fails with [`QueryError::IndexRootMissing`] if the store root is not
    /// a directory. Malformed shards are skipped and listed in
    /// [`LoadStats::malformed`].
    pub fn load(
        store: &dyn PostingsStore,
        metadata: Arc<dyn MetadataStore>,
        normalizer: Normalizer,
    ) -> Result<Self, QueryError> {
        let scan = store.scan().map_err(|e| match e {
            StorageError::IndexRootMissing(path) => QueryError::IndexRootMissing(path),
            other => QueryError::Storage(other),
        })?;

        let mut index: HashMap<String, WordEntry> = HashMap::with_capacity(scan.entries.len());
        let mut documents: BTreeSet<DocumentId> = BTreeSet::new();
        for entry in scan.entries {
            documents.extend(entry.allocations.keys().copied());
            match index.get_mut(&entry.lemma) {
                Some(existing) => {
                    debug!(lemma = %entry.lemma, "Duplicate shard for lemma, merging");
                    existing.merge(&entry);
                }
                None => {
                    index.insert(entry.lemma.clone(), entry);
                }
            }
        }

        let stats = LoadStats {
            encoding: store.encoding(),
            lemmas: index.len(),
            documents: documents.len(),
            metadata_records: metadata.len(),
            malformed: scan.malformed,
        };

        if !stats.malformed.is_empty() {
            warn!(count = stats.malformed.len(), "Some shards could not be loaded");
        }
        info!(
            encoding = %stats.encoding,
            root = ?store.root(),
            lemmas = stats.lemmas,
            documents = stats.documents,
            metadata = stats.metadata_records,
            "Index loaded"
        );

        Ok(Self {
            index,
            metadata,
            normalizer,
            stats,
        })
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    /// Lemma a query term maps to, if it survives normalization.
    pub fn normalize_term(&self, term: &str) -> Option<String> {
        self.normalizer.normalize(term.trim())
    }

    /// Stored entry for an already-normalized lemma.
    pub fn entry(&self, lemma: &str) -> Option<&WordEntry> {
        self.index.get(lemma)
    }

    /// Documents containing `term`, ascending by document id.
    ///
    /// The term goes through the same normalizer used for indexing, so the
    /// lookup is exact on the lemma: no substring or fuzzy matching.
    pub fn query(&self, term: &str) -> Vec<QueryHit> {
        let Some(lemma) = self.normalize_term(term) else {
            debug!(term, "Query term normalized to nothing");
            return Vec::new();
        };
        let Some(entry) = self.index.get(&lemma) else {
            debug!(term, lemma = %lemma, "No postings for lemma");
            return Vec::new();
        };

        entry
            .allocations
            .iter()
            .map(|(document_id, allocation)| QueryHit {
                document_id: *document_id,
                total_occurrences: allocation.times,
                positions: allocation.positions.iter().copied().collect(),
                metadata: self.metadata.get(*document_id).cloned(),
            })
            .collect()
    }

    /// Source lines of `hit`, with tokens that normalize to `lemma`
    /// highlighted. Empty if the document cannot be read.
    pub fn context(
        &self,
        source: &dyn DocumentSource,
        hit: &QueryHit,
        lemma: &str,
        highlighter: &Highlighter,
    ) -> Vec<ContextLine> {
        let text = match source.read(hit.document_id) {
            Ok(text) => text,
            Err(e) => {
                debug!(document_id = %hit.document_id, error = %e, "No context available");
                return Vec::new();
            }
        };
        context_lines(&text, &hit.positions, highlighter, |token| {
            self.normalizer.normalize(token).as_deref() == Some(lemma)
        })
    }
}
