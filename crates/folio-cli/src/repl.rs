//! Query frontend: interactive session and one-shot lookup.
//!
//! Both are generic over their input and output so sessions can be driven
//! from tests as well as from a terminal.

use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use folio_normalize::Normalizer;
use folio_query::{Highlighter, QueryEngine};
use folio_storage::{open_store, CsvMetadataStore, DirectorySource, DocumentSource};
use folio_types::{Settings, ShardEncoding};

use crate::commands::recorded_lemmatizer;

/// Output options for query results.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Print the matching source lines
    pub context: bool,
    /// Highlight matches in context lines with ANSI colors
    pub color: bool,
}

/// Load metadata and one backend into a query engine.
///
/// Terms are normalized with the lemmatizer recorded for the backend,
/// falling back to the configured one for an index without a record.
fn open_engine(settings: &Settings, encoding: ShardEncoding) -> Result<QueryEngine> {
    let lemmatizer = recorded_lemmatizer(settings, encoding)?.unwrap_or(settings.lemmatizer);
    let metadata_path = settings.metadata_file();
    let metadata = CsvMetadataStore::load(&metadata_path)
        .with_context(|| format!("Failed to load metadata from {}", metadata_path.display()))?;
    let store = open_store(encoding, settings.shard_root(encoding));
    QueryEngine::load(
        store.as_ref(),
        Arc::new(metadata),
        Normalizer::from_kind(lemmatizer),
    )
    .with_context(|| format!("Failed to load the {} index", encoding))
}

/// Interactive query loop.
///
/// Prompts for the backend when `backend` is `None`, then answers one term
/// per line until the sentinel word (case-insensitive) or end of input.
pub fn run_query_session<R: BufRead, W: Write>(
    settings: &Settings,
    backend: Option<ShardEncoding>,
    options: QueryOptions,
    mut input: R,
    out: &mut W,
) -> Result<()> {
    let encoding = match backend {
        Some(encoding) => encoding,
        None => {
            write!(out, "Which index do you want to load? (json/tsv): ")?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }
            match line.trim().parse::<ShardEncoding>() {
                Ok(encoding) => encoding,
                Err(_) => {
                    writeln!(out, "Invalid option '{}'. Expected json or tsv.", line.trim())?;
                    bail!("invalid index option '{}'", line.trim());
                }
            }
        }
    };

    writeln!(out, "Loading {} index...", encoding)?;
    let engine = open_engine(settings, encoding)?;
    let stats = engine.stats();
    writeln!(
        out,
        "Loaded {} lemma(s) across {} document(s), {} metadata record(s).",
        stats.lemmas, stats.documents, stats.metadata_records
    )?;
    if !stats.malformed.is_empty() {
        writeln!(
            out,
            "Warning: {} shard(s) could not be read and were skipped.",
            stats.malformed.len()
        )?;
    }
    writeln!(out, "Type a word to search ('{}' to quit).", settings.sentinel)?;

    let source = DirectorySource::new(settings.books_path());
    let mut queries = 0usize;
    loop {
        write!(out, "Query: ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }
        let term = line.trim();
        if term.is_empty() {
            continue;
        }
        if term.eq_ignore_ascii_case(settings.sentinel.trim()) {
            break;
        }
        render_results(&engine, term, options, &source, out)?;
        queries += 1;
    }

    info!(queries, "Query session ended");
    Ok(())
}

/// Answer a single term. Returns the number of matching documents.
pub fn run_lookup<W: Write>(
    settings: &Settings,
    encoding: ShardEncoding,
    term: &str,
    options: QueryOptions,
    out: &mut W,
) -> Result<usize> {
    let engine = open_engine(settings, encoding)?;
    let source = DirectorySource::new(settings.books_path());
    render_results(&engine, term.trim(), options, &source, out)
}

fn render_results<W: Write>(
    engine: &QueryEngine,
    term: &str,
    options: QueryOptions,
    source: &dyn DocumentSource,
    out: &mut W,
) -> Result<usize> {
    let hits = engine.query(term);
    let Some(lemma) = engine.normalize_term(term).filter(|_| !hits.is_empty()) else {
        writeln!(out, "No results found for the word: {}", term)?;
        return Ok(0);
    };

    let total: u64 = hits.iter().map(|h| u64::from(h.total_occurrences)).sum();
    writeln!(
        out,
        "Results found for the word: {} (lemma '{}', {} document(s), {} occurrence(s))",
        term,
        lemma,
        hits.len(),
        total
    )?;

    let highlighter = if options.color {
        Highlighter::ansi()
    } else {
        Highlighter::new("[", "]")
    };

    for hit in &hits {
        match &hit.metadata {
            Some(meta) => writeln!(
                out,
                "Book {}: {} | Author: {} | Occurrences: {}",
                hit.document_id,
                meta.title,
                if meta.author.is_empty() {
                    "unknown"
                } else {
                    meta.author.as_str()
                },
                hit.total_occurrences
            )?,
            None => writeln!(
                out,
                "Book ID: {} | Occurrences: {}",
                hit.document_id, hit.total_occurrences
            )?,
        }

        let lines: BTreeSet<u32> = hit.positions.iter().map(|p| p.line).collect();
        let lines: Vec<String> = lines.iter().map(u32::to_string).collect();
        writeln!(out, "  Lines: {}", lines.join(", "))?;

        if options.context {
            for context in engine.context(source, hit, &lemma, &highlighter) {
                writeln!(out, "  Line {}: {}", context.line, context.text)?;
            }
        }
    }
    Ok(hits.len())
}
