//! Command implementations for folio.
//!
//! Handles:
//! - index: run the builder for each selected backend
//! - status: report checkpoints, lemmatizers, shard counts and source size
//! - metadata add: append a deduplicated metadata row

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use folio_indexing::{BuildReport, IndexBuilder, IndexerConfig};
use folio_normalize::Normalizer;
use folio_storage::{
    append_metadata, open_store, CheckpointStore, CsvMetadataStore, DirectorySource,
    DocumentSource, FileCheckpointStore, LemmatizerRecord, MetadataStore,
};
use folio_types::{
    BackendSelection, DocumentId, DocumentMetadata, LemmatizerKind, Settings, ShardEncoding,
};

/// Load settings and apply global CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    data_dir_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(data_dir) = data_dir_override {
        settings.data_dir = data_dir.to_string();
    }
    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

/// Install the global tracing subscriber. Logs go to stderr so stdout only
/// carries command output.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Lemmatizer recorded for one backend's shards, if any.
pub fn recorded_lemmatizer(
    settings: &Settings,
    encoding: ShardEncoding,
) -> Result<Option<LemmatizerKind>> {
    LemmatizerRecord::new(settings.lemmatizer_record_path(encoding))
        .read()
        .with_context(|| format!("Failed to read the {} lemmatizer record", encoding))
}

/// Pick the lemmatizer for indexing into `encoding`.
///
/// A recorded lemmatizer wins over the configured one. An explicit
/// override that disagrees with the record is refused, since its lemmas
/// would land next to lemmas of another key space.
fn choose_lemmatizer(
    encoding: ShardEncoding,
    recorded: Option<LemmatizerKind>,
    requested: Option<LemmatizerKind>,
    configured: LemmatizerKind,
) -> Result<LemmatizerKind> {
    match (recorded, requested) {
        (Some(recorded), Some(requested)) if recorded != requested => bail!(
            "The {} index was built with the {} lemmatizer; refusing to index it with {}",
            encoding,
            recorded,
            requested
        ),
        (Some(recorded), _) => {
            if recorded != configured {
                warn!(
                    encoding = %encoding,
                    recorded = %recorded,
                    configured = %configured,
                    "Using the recorded lemmatizer instead of the configured one"
                );
            }
            Ok(recorded)
        }
        (None, requested) => Ok(requested.unwrap_or(configured)),
    }
}

/// Overrides accepted by the `index` command.
#[derive(Debug, Clone, Default)]
pub struct IndexOverrides {
    pub backend: Option<BackendSelection>,
    pub books_dir: Option<String>,
    pub lemmatizer: Option<LemmatizerKind>,
    pub stop_on_source_error: bool,
}

/// Run the index builder once per selected backend and print a summary.
///
/// Backends run in order and each keeps its own checkpoint; a failure in
/// one stops the command before the next one starts. Every backend's
/// lemmatizer is settled before any indexing begins.
pub fn run_index(
    settings: &Settings,
    overrides: IndexOverrides,
    out: &mut impl Write,
) -> Result<Vec<BuildReport>> {
    let mut settings = settings.clone();
    if let Some(backend) = overrides.backend {
        settings.backend = backend;
    }
    if let Some(books_dir) = overrides.books_dir {
        settings.books_dir = books_dir;
    }
    if overrides.stop_on_source_error {
        settings.continue_on_source_error = false;
    }

    let mut plans = Vec::new();
    for encoding in settings.backend.encodings() {
        let recorded = recorded_lemmatizer(&settings, encoding)?;
        let kind = choose_lemmatizer(encoding, recorded, overrides.lemmatizer, settings.lemmatizer)?;
        plans.push((encoding, kind, recorded.is_none()));
    }

    let source: Arc<dyn DocumentSource> = Arc::new(DirectorySource::new(settings.books_path()));
    let config =
        IndexerConfig::default().with_continue_on_source_error(settings.continue_on_source_error);

    info!(
        books = ?settings.books_path(),
        index = ?settings.index_path(),
        backend = ?settings.backend,
        "Indexing"
    );

    let mut reports = Vec::new();
    for (encoding, kind, unrecorded) in plans {
        if unrecorded {
            LemmatizerRecord::new(settings.lemmatizer_record_path(encoding))
                .write(kind)
                .with_context(|| format!("Failed to record the {} lemmatizer", encoding))?;
        }
        let normalizer = Normalizer::from_kind(kind);
        info!(encoding = %encoding, lemmatizer = normalizer.lemmatizer_name(), "Indexing backend");

        let store = open_store(encoding, settings.shard_root(encoding));
        let checkpoint = Arc::new(FileCheckpointStore::new(settings.checkpoint_path(encoding)));
        let builder = IndexBuilder::new(source.clone(), store, checkpoint, normalizer)
            .with_config(config.clone());

        let report = builder
            .run()
            .with_context(|| format!("Indexing into the {} backend failed", encoding))?;

        writeln!(
            out,
            "{}: indexed {} document(s), skipped {}, shards created {} updated {} unchanged {}, checkpoint {} -> {}",
            encoding,
            report.indexed,
            report.skipped.len(),
            report.created,
            report.updated,
            report.unchanged,
            report.start_checkpoint,
            report.checkpoint
        )?;
        if !report.skipped.is_empty() {
            let ids: Vec<String> = report.skipped.iter().map(|id| id.to_string()).collect();
            writeln!(out, "  unreadable: {}", ids.join(", "))?;
        }
        reports.push(report);
    }
    Ok(reports)
}

/// Print checkpoint and shard count for every backend.
pub fn show_status(settings: &Settings, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Data directory: {}", settings.resolve("").display())?;

    let source = DirectorySource::new(settings.books_path());
    match source.list() {
        Ok(ids) => writeln!(
            out,
            "Documents: {} in {}",
            ids.len(),
            settings.books_path().display()
        )?,
        Err(e) => {
            warn!(error = %e, "Document source unavailable");
            writeln!(out, "Documents: unavailable ({})", settings.books_path().display())?
        }
    }

    for encoding in BackendSelection::Both.encodings() {
        let checkpoint_path = settings.checkpoint_path(encoding);
        // Reading an absent checkpoint would create it; status stays read-only.
        let checkpoint = if checkpoint_path.exists() {
            FileCheckpointStore::new(&checkpoint_path).read().to_string()
        } else {
            "none".to_string()
        };
        let lemmatizer = match recorded_lemmatizer(settings, encoding) {
            Ok(Some(kind)) => kind.to_string(),
            Ok(None) => "none".to_string(),
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Lemmatizer record unreadable");
                "unreadable".to_string()
            }
        };
        let store = open_store(encoding, settings.shard_root(encoding));
        writeln!(
            out,
            "{}: checkpoint {}, {} shard(s) under {}, lemmatizer {}",
            encoding,
            checkpoint,
            store.shard_count(),
            store.root().display(),
            lemmatizer
        )?;
    }

    let metadata = CsvMetadataStore::load(&settings.metadata_file())
        .context("Failed to load metadata")?;
    writeln!(out, "Metadata records: {}", metadata.len())?;
    Ok(())
}

/// Append a metadata row. Returns whether a new row was written.
pub fn add_metadata(
    settings: &Settings,
    record: &DocumentMetadata,
    out: &mut impl Write,
) -> Result<bool> {
    let path = settings.metadata_file();
    let added = append_metadata(&path, record)
        .with_context(|| format!("Failed to append metadata to {}", path.display()))?;
    if added {
        writeln!(out, "Added metadata for document {}", record.id)?;
    } else {
        writeln!(out, "Metadata for document {} already present", record.id)?;
    }
    Ok(added)
}

/// Build a metadata record from `metadata add` arguments.
pub fn metadata_record(
    id: u64,
    title: String,
    author: String,
    release_date: String,
    updated: String,
    language: String,
) -> Result<DocumentMetadata> {
    let id = DocumentId::new(id).context("Invalid document id")?;
    Ok(DocumentMetadata {
        id,
        title,
        author,
        release_date,
        updated,
        language,
    })
}
