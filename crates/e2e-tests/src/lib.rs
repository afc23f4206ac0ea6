//! End-to-end test infrastructure for folio.
//!
//! Provides a shared TestHarness and helper functions for E2E tests
//! covering the full document-to-query pipeline.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use walkdir::WalkDir;

use folio_indexing::{BuildReport, IndexBuilder, IndexerConfig, IndexingError};
use folio_normalize::Normalizer;
use folio_query::QueryEngine;
use folio_storage::{
    open_store, CsvMetadataStore, DirectorySource, FileCheckpointStore, MergeOutcome,
    PostingsStore, ShardScan, StorageError,
};
use folio_types::{DocumentId, Settings, ShardEncoding, WordEntry};

/// Shared test harness for E2E tests.
///
/// Lays out a data directory (books, index, checkpoints, metadata) inside a
/// temp dir, using the same paths the CLI resolves from [`Settings`].
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    pub settings: Settings,
    pub normalizer: Normalizer,
}

impl TestHarness {
    /// Create a new harness with an empty books directory.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let settings = Settings::with_data_dir(temp_dir.path());
        fs::create_dir_all(settings.books_path()).expect("Failed to create books dir");

        Self {
            _temp_dir: temp_dir,
            settings,
            normalizer: Normalizer::case_fold(),
        }
    }

    pub fn books_dir(&self) -> PathBuf {
        self.settings.books_path()
    }

    /// Write `<id>.txt` into the books directory.
    pub fn add_book(&self, id: u64, text: &str) {
        fs::write(self.books_dir().join(format!("{}.txt", id)), text).expect("Failed to write book");
    }

    /// Replace a book with bytes that are not valid UTF-8.
    pub fn corrupt_book(&self, id: u64) {
        fs::write(self.books_dir().join(format!("{}.txt", id)), [0xff, 0xfe, 0xfd])
            .expect("Failed to corrupt book");
    }

    pub fn store(&self, encoding: ShardEncoding) -> Arc<dyn PostingsStore> {
        open_store(encoding, self.settings.shard_root(encoding))
    }

    pub fn checkpoint(&self, encoding: ShardEncoding) -> Arc<FileCheckpointStore> {
        Arc::new(FileCheckpointStore::new(self.settings.checkpoint_path(encoding)))
    }

    /// Builder over the books directory writing through `store`.
    pub fn builder_with_store(
        &self,
        encoding: ShardEncoding,
        store: Arc<dyn PostingsStore>,
    ) -> IndexBuilder {
        IndexBuilder::new(
            Arc::new(DirectorySource::new(self.books_dir())),
            store,
            self.checkpoint(encoding),
            self.normalizer.clone(),
        )
        .with_config(IndexerConfig::default())
    }

    pub fn builder(&self, encoding: ShardEncoding) -> IndexBuilder {
        self.builder_with_store(encoding, self.store(encoding))
    }

    /// Run one indexing pass, panicking on failure.
    pub fn index(&self, encoding: ShardEncoding) -> BuildReport {
        self.builder(encoding).run().expect("Index run failed")
    }

    /// Run one indexing pass with merges failing after `budget` successes.
    pub fn index_failing_after(
        &self,
        encoding: ShardEncoding,
        budget: usize,
    ) -> Result<BuildReport, IndexingError> {
        let store = Arc::new(FailAfterStore::new(self.store(encoding), budget));
        self.builder_with_store(encoding, store).run()
    }

    /// Load a query engine over one backend, with the harness metadata.
    pub fn engine(&self, encoding: ShardEncoding) -> QueryEngine {
        let metadata = CsvMetadataStore::load(&self.settings.metadata_file())
            .expect("Failed to load metadata");
        QueryEngine::load(
            self.store(encoding).as_ref(),
            Arc::new(metadata),
            self.normalizer.clone(),
        )
        .expect("Failed to load query engine")
    }

    /// Raw contents of every shard file of one backend, keyed by relative path.
    pub fn shard_snapshot(&self, encoding: ShardEncoding) -> BTreeMap<PathBuf, String> {
        let root = self.settings.shard_root(encoding);
        if !root.is_dir() {
            return BTreeMap::new();
        }
        WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| entry.expect("Failed to walk shard root"))
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry.path().extension().and_then(|e| e.to_str()) == Some(encoding.extension())
            })
            .map(|entry| {
                let rel = entry.path().strip_prefix(&root).expect("path under root");
                let text = fs::read_to_string(entry.path()).expect("Failed to read shard");
                (rel.to_path_buf(), text)
            })
            .collect()
    }

    /// Overwrite a backend's checkpoint file directly.
    pub fn set_checkpoint(&self, encoding: ShardEncoding, value: u64) {
        let path = self.settings.checkpoint_path(encoding);
        fs::create_dir_all(path.parent().expect("checkpoint has a parent"))
            .expect("Failed to create checkpoint dir");
        fs::write(path, value.to_string()).expect("Failed to write checkpoint");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Postings store wrapper whose merges fail once a budget is spent.
///
/// Models a shard write failing partway through a document.
pub struct FailAfterStore {
    inner: Arc<dyn PostingsStore>,
    remaining: AtomicUsize,
}

impl FailAfterStore {
    pub fn new(inner: Arc<dyn PostingsStore>, budget: usize) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(budget),
        }
    }
}

impl PostingsStore for FailAfterStore {
    fn encoding(&self) -> ShardEncoding {
        self.inner.encoding()
    }

    fn root(&self) -> &Path {
        self.inner.root()
    }

    fn get(&self, lemma: &str) -> Result<Option<WordEntry>, StorageError> {
        self.inner.get(lemma)
    }

    fn merge(&self, lemma: &str, incoming: &WordEntry) -> Result<MergeOutcome, StorageError> {
        let granted = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !granted {
            return Err(StorageError::ShardIo {
                path: self.inner.root().join(lemma),
                source: std::io::Error::other("injected shard failure"),
            });
        }
        self.inner.merge(lemma, incoming)
    }

    fn scan(&self) -> Result<ShardScan, StorageError> {
        self.inner.scan()
    }
}

/// Small vocabulary for generated corpora, including tokens the normalizer
/// rejects or folds.
const VOCABULARY: &[&str] = &[
    "whale", "Whale", "sea", "ship", "captain", "harpoon", "the", "a", "of", "Ahab's", "white",
    "ocean", "1851", "_note", "CON", "café", "voyage", "storm", "deck", "rope",
];

/// Deterministic pseudo-random book text: `lines` lines of 1..=12 tokens.
pub fn generate_book(rng: &mut StdRng, lines: usize) -> String {
    let mut text = String::new();
    for _ in 0..lines {
        let words = rng.random_range(1..=12);
        let line: Vec<&str> = (0..words)
            .map(|_| VOCABULARY[rng.random_range(0..VOCABULARY.len())])
            .collect();
        text.push_str(&line.join(" "));
        text.push('\n');
    }
    text
}

/// Generate `count` books with ids `1..=count` from a fixed seed.
pub fn generate_corpus(seed: u64, count: u64, lines: usize) -> Vec<(u64, String)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (1..=count)
        .map(|id| (id, generate_book(&mut rng, lines)))
        .collect()
}

/// Brute-force occurrence count of `lemma` per document, for checking
/// query results against the raw text.
pub fn count_occurrences(
    normalizer: &Normalizer,
    corpus: &[(u64, String)],
    lemma: &str,
) -> BTreeMap<DocumentId, u32> {
    let mut counts = BTreeMap::new();
    for (id, text) in corpus {
        let n = text
            .split_whitespace()
            .filter(|token| normalizer.normalize(token).as_deref() == Some(lemma))
            .count() as u32;
        if n > 0 {
            counts.insert(DocumentId::new(*id).expect("positive id"), n);
        }
    }
    counts
}
