//! Checkpointed index builder.

use std::collections::BTreeMap;
use std::sync::Arc;

use folio_normalize::{tokenize, Normalizer};
use folio_storage::{CheckpointStore, DocumentSource, PostingsStore};
use folio_types::{DocumentId, WordEntry};
use tracing::{debug, error, info, warn};

use crate::error::IndexingError;
use crate::report::{BuildReport, DocumentOutcome, DocumentSummary};

/// Configuration for the index builder.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Keep processing later documents after an unreadable one.
    ///
    /// The checkpoint stays at the last id before the unreadable document
    /// either way, so the next run retries it (and re-merges the documents
    /// after it, which is idempotent).
    pub continue_on_source_error: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            continue_on_source_error: true,
        }
    }
}

impl IndexerConfig {
    pub fn with_continue_on_source_error(mut self, continue_on_source_error: bool) -> Self {
        self.continue_on_source_error = continue_on_source_error;
        self
    }
}

/// Builds postings for every document above the checkpoint.
///
/// Assumes it is the only writer against its store and checkpoint. Shard
/// merges are read-then-write, so two concurrent builders on one data
/// directory can lose updates.
pub struct IndexBuilder {
    source: Arc<dyn DocumentSource>,
    store: Arc<dyn PostingsStore>,
    checkpoint: Arc<dyn CheckpointStore>,
    normalizer: Normalizer,
    config: IndexerConfig,
}

impl IndexBuilder {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        store: Arc<dyn PostingsStore>,
        checkpoint: Arc<dyn CheckpointStore>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            source,
            store,
            checkpoint,
            normalizer,
            config: IndexerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: IndexerConfig) -> Self {
        self.config = config;
        self
    }

    /// Run one indexing pass.
    ///
    /// Returns `Err` for failures that must stop the run (shard or
    /// checkpoint I/O); unreadable documents are reported, not raised.
    pub fn run(&self) -> Result<BuildReport, IndexingError> {
        let start = self.checkpoint.read();
        let mut report = BuildReport::new(self.store.encoding(), start);

        let mut pending: Vec<DocumentId> = self
            .source
            .list()
            .map_err(IndexingError::Source)?
            .into_iter()
            .filter(|id| id.get() > start)
            .collect();
        pending.sort();
        pending.dedup();

        info!(
            encoding = %self.store.encoding(),
            checkpoint = start,
            pending = pending.len(),
            normalizer = self.normalizer.lemmatizer_name(),
            "Starting index run"
        );

        // Set once a document is skipped: later documents are still merged
        // but the checkpoint must not move past the skipped one.
        let mut frozen_at: Option<DocumentId> = None;

        for id in pending {
            match self.index_document(id) {
                Ok(DocumentOutcome::Indexed { summary, .. }) => {
                    report.record_indexed(&summary);
                    if frozen_at.is_none() {
                        self.checkpoint.write(id.get()).map_err(|source| {
                            error!(document_id = %id, error = %source, "Checkpoint write failed, stopping run");
                            IndexingError::Checkpoint {
                                document: id,
                                source,
                            }
                        })?;
                        report.checkpoint = id.get();
                    }
                    info!(
                        document_id = %id,
                        lemmas = summary.lemmas,
                        occurrences = summary.occurrences,
                        checkpoint = report.checkpoint,
                        "Indexed document"
                    );
                }
                Ok(DocumentOutcome::Skipped { reason, .. }) => {
                    warn!(document_id = %id, reason = %reason, "Skipping unreadable document");
                    report.record_skip(id);
                    frozen_at.get_or_insert(id);
                    if !self.config.continue_on_source_error {
                        report.stopped_early = true;
                        break;
                    }
                }
                Err(e) => {
                    error!(document_id = %id, error = %e, "Stopping index run");
                    return Err(e);
                }
            }
        }

        if let Some(id) = frozen_at {
            warn!(
                document_id = %id,
                checkpoint = report.checkpoint,
                "Checkpoint held before unreadable document; it will be retried next run"
            );
        }

        info!(
            encoding = %report.encoding,
            indexed = report.indexed,
            skipped = report.skipped.len(),
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            checkpoint = report.checkpoint,
            "Index run complete"
        );
        Ok(report)
    }

    /// Read, accumulate and merge one document. Does not touch the
    /// checkpoint.
    pub fn index_document(&self, id: DocumentId) -> Result<DocumentOutcome, IndexingError> {
        let text = match self.source.read(id) {
            Ok(text) => text,
            Err(e) => {
                return Ok(DocumentOutcome::Skipped {
                    id,
                    reason: e.to_string(),
                })
            }
        };

        let entries = self.accumulate(id, &text);
        let mut summary = DocumentSummary::default();
        for (lemma, entry) in &entries {
            let outcome = self
                .store
                .merge(lemma, entry)
                .map_err(|source| IndexingError::Shard {
                    document: id,
                    source,
                })?;
            debug!(document_id = %id, lemma = %lemma, outcome = ?outcome, "Merged lemma");
            summary.occurrences += entry.total as usize;
            summary.record_merge(outcome);
        }

        Ok(DocumentOutcome::Indexed { id, summary })
    }

    /// Per-lemma postings for one document, keyed by lemma.
    ///
    /// Each entry holds a single allocation for `id`; `total` and `times`
    /// count the occurrences recorded in this pass.
    pub fn accumulate(&self, id: DocumentId, text: &str) -> BTreeMap<String, WordEntry> {
        let mut entries: BTreeMap<String, WordEntry> = BTreeMap::new();
        for token in tokenize(text) {
            if let Some(lemma) = self.normalizer.normalize(token.text) {
                entries
                    .entry(lemma)
                    .or_insert_with_key(|lemma| WordEntry::new(lemma.clone()))
                    .record(id, token.position);
            }
        }
        entries
    }
}
