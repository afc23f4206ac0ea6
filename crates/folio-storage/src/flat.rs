//! TSV shard backend with per-line counts.
//!
//! ```text
//! Book_ID	Line	Occurrences
//! 1	1	2
//! 2	14	1
//! ```
//!
//! Only the line and the number of occurrences on it are kept. On load,
//! a row `(doc, line, n)` becomes the positions `(line, 1) ..= (line, n)`,
//! so word indexes read back from a flat shard are approximate.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use folio_types::{Allocation, DocumentId, Position, ShardEncoding, WordEntry};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::postings::{ensure_lemma, scan_shards, MergeOutcome, PostingsStore, ShardScan};
use crate::shard::{write_atomic, ShardKey};

/// Header row of every flat shard
pub const FLAT_HEADER: [&str; 3] = ["Book_ID", "Line", "Occurrences"];

/// Largest number of occurrences one `(document, line)` may expand to when
/// reading a shard. Rows above it are rejected like any other bad row.
pub const MAX_LINE_OCCURRENCES: u32 = 1 << 20;

/// One `(document, line, count)` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FlatRow {
    pub document: DocumentId,
    pub line: u32,
    pub occurrences: u32,
}

/// Parsed shard: valid rows plus the raw text of rows that were rejected.
#[derive(Debug, Default)]
struct FlatTable {
    rows: Vec<FlatRow>,
    rejected: Vec<String>,
}

impl FlatTable {
    fn parse(path: &Path, bytes: &[u8]) -> Result<Self, StorageError> {
        let malformed = |reason: String| StorageError::MalformedRecord {
            path: path.to_path_buf(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers = reader.headers().map_err(|e| malformed(e.to_string()))?;
        if headers.iter().map(str::trim).ne(FLAT_HEADER.iter().copied()) {
            return Err(malformed(format!(
                "unexpected header {:?}",
                headers.iter().collect::<Vec<_>>()
            )));
        }

        let mut table = FlatTable::default();
        for record in reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    table.rejected.push(e.to_string());
                    continue;
                }
            };
            match parse_row(&record) {
                Some(row) => table.rows.push(row),
                None => table.rejected.push(record.iter().collect::<Vec<_>>().join("\t")),
            }
        }
        Ok(table)
    }

    fn encode(rows: &[FlatRow]) -> Result<Vec<u8>, StorageError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .terminator(csv::Terminator::Any(b'\n'))
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(FLAT_HEADER)?;
        for row in rows {
            writer.write_record([
                row.document.to_string(),
                row.line.to_string(),
                row.occurrences.to_string(),
            ])?;
        }
        writer
            .into_inner()
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Expand rows into an entry with approximated positions.
    ///
    /// Repeated `(doc, line)` rows continue the word index instead of
    /// restarting it, so no occurrence is lost to position collisions.
    fn to_entry(&self, lemma: &str) -> WordEntry {
        let mut positions: BTreeMap<DocumentId, BTreeSet<Position>> = BTreeMap::new();
        let mut next_index: BTreeMap<(DocumentId, u32), u32> = BTreeMap::new();
        for row in &self.rows {
            let start = next_index.entry((row.document, row.line)).or_insert(0);
            let end = match start.checked_add(row.occurrences) {
                Some(end) if end <= MAX_LINE_OCCURRENCES => end,
                _ => {
                    warn!(lemma, document = %row.document, line = row.line, "Too many occurrences on one line, dropping flat row");
                    continue;
                }
            };
            let doc_positions = positions.entry(row.document).or_default();
            doc_positions.extend((*start + 1..=end).map(|index| Position::new(row.line, index)));
            *start = end;
        }

        let mut entry = WordEntry::new(lemma);
        entry.allocations = positions
            .into_iter()
            .map(|(doc, set)| (doc, Allocation::from_positions(set)))
            .collect();
        entry.total = entry.recount_total();
        entry
    }
}

fn parse_row(record: &csv::StringRecord) -> Option<FlatRow> {
    if record.len() < 3 {
        return None;
    }
    let document = record[0].trim().parse::<DocumentId>().ok()?;
    let line = record[1].trim().parse::<u32>().ok()?;
    let occurrences = record[2].trim().parse::<u32>().ok()?;
    if line == 0 || occurrences == 0 || occurrences > MAX_LINE_OCCURRENCES {
        return None;
    }
    Some(FlatRow {
        document,
        line,
        occurrences,
    })
}

/// Rows describing `incoming`, one per `(document, line)`.
fn rows_for(incoming: &WordEntry) -> impl Iterator<Item = FlatRow> + '_ {
    incoming
        .allocations
        .iter()
        .flat_map(|(document, allocation)| {
            allocation
                .per_line_counts()
                .into_iter()
                .map(move |(line, occurrences)| FlatRow {
                    document: *document,
                    line,
                    occurrences,
                })
        })
}

/// Flat (TSV) postings store.
///
/// Merge replaces every row of each incoming document with rows computed
/// from the incoming allocation. Re-merging a document therefore rewrites
/// the same rows instead of appending duplicates. Unlike
/// [`StructuredStore`](crate::StructuredStore), two partial merges of the
/// same document do not combine: the later one wins.
#[derive(Debug, Clone)]
pub struct FlatStore {
    root: PathBuf,
}

impl FlatStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn shard_path(&self, key: &ShardKey) -> PathBuf {
        self.root.join(key.relative_path(ShardEncoding::Flat))
    }

    fn read_table(path: &Path) -> Result<Option<FlatTable>, StorageError> {
        match fs::read(path) {
            Ok(bytes) => FlatTable::parse(path, &bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::ShardIo {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Decode a shard for reading; bad rows are logged and skipped.
    fn decode(path: &Path) -> Result<WordEntry, StorageError> {
        let key = ShardKey::from_path(path).map_err(|e| StorageError::MalformedRecord {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let table = Self::read_table(path)?.ok_or_else(|| StorageError::ShardIo {
            path: path.to_path_buf(),
            source: std::io::Error::from(ErrorKind::NotFound),
        })?;
        for row in &table.rejected {
            warn!(path = ?path, row = %row, "Skipping invalid flat shard row");
        }
        Ok(table.to_entry(key.lemma()))
    }
}

impl PostingsStore for FlatStore {
    fn encoding(&self) -> ShardEncoding {
        ShardEncoding::Flat
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn get(&self, lemma: &str) -> Result<Option<WordEntry>, StorageError> {
        let key = ShardKey::new(lemma)?;
        let path = self.shard_path(&key);
        if !path.is_file() {
            return Ok(None);
        }
        Self::decode(&path).map(Some)
    }

    fn merge(&self, lemma: &str, incoming: &WordEntry) -> Result<MergeOutcome, StorageError> {
        ensure_lemma(lemma, incoming)?;
        let key = ShardKey::new(lemma)?;
        let path = self.shard_path(&key);

        let existing = Self::read_table(&path)?;
        if let Some(table) = &existing {
            // Rewriting would silently drop the rows we could not parse.
            if let Some(row) = table.rejected.first() {
                return Err(StorageError::MalformedRecord {
                    path,
                    reason: format!("unparsable row {:?}", row),
                });
            }
        }

        let mut old_rows = existing.as_ref().map(|t| t.rows.clone()).unwrap_or_default();
        old_rows.sort();

        let mut rows: Vec<FlatRow> = old_rows
            .iter()
            .filter(|row| !incoming.allocations.contains_key(&row.document))
            .copied()
            .chain(rows_for(incoming))
            .collect();
        rows.sort();

        if existing.is_some() && rows == old_rows {
            return Ok(MergeOutcome::Unchanged);
        }

        let bytes = FlatTable::encode(&rows)?;
        write_atomic(&path, &bytes).map_err(|source| StorageError::ShardIo {
            path: path.clone(),
            source,
        })?;
        debug!(lemma, rows = rows.len(), "Merged flat shard");

        Ok(if existing.is_some() {
            MergeOutcome::Updated
        } else {
            MergeOutcome::Created
        })
    }

    fn scan(&self) -> Result<ShardScan, StorageError> {
        scan_shards(&self.root, ShardEncoding::Flat, Self::decode)
    }
}
