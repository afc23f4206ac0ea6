//! Document metadata CSV.
//!
//! Columns: `ID,Title,Author,Release Date,Most Recently Updated,Language`.
//! Fields are written quoted; rows that fail to parse on load are skipped.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use folio_types::{DocumentId, DocumentMetadata};
use tracing::{debug, info, warn};

use crate::error::StorageError;

/// Header line of the metadata file
pub const METADATA_HEADER: &str = "ID,Title,Author,Release Date,Most Recently Updated,Language";

/// Lookup of descriptive metadata by document id.
pub trait MetadataStore: Send + Sync {
    fn get(&self, id: DocumentId) -> Option<&DocumentMetadata>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Metadata loaded fully into memory from a CSV file.
#[derive(Debug, Default)]
pub struct CsvMetadataStore {
    records: HashMap<DocumentId, DocumentMetadata>,
    skipped: usize,
}

impl CsvMetadataStore {
    /// Empty store, used when no metadata file exists.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from records already in memory. First record per id wins.
    pub fn from_records(records: impl IntoIterator<Item = DocumentMetadata>) -> Self {
        let mut store = Self::default();
        for record in records {
            store.records.entry(record.id).or_insert(record);
        }
        store
    }

    /// Load `path`. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = ?path, "No metadata file, continuing without metadata");
                return Ok(Self::empty());
            }
            Err(source) => {
                return Err(StorageError::MetadataIo {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes.as_slice());

        let mut store = Self::default();
        for (index, result) in reader.deserialize::<DocumentMetadata>().enumerate() {
            match result {
                Ok(record) if record.id.get() > 0 => {
                    if store.records.contains_key(&record.id) {
                        debug!(id = %record.id, "Duplicate metadata row ignored");
                        continue;
                    }
                    store.records.insert(record.id, record);
                }
                Ok(_) => {
                    warn!(path = ?path, row = index + 1, "Skipping metadata row with id 0");
                    store.skipped += 1;
                }
                Err(e) => {
                    warn!(path = ?path, row = index + 1, error = %e, "Skipping malformed metadata row");
                    store.skipped += 1;
                }
            }
        }

        info!(
            path = ?path,
            records = store.records.len(),
            skipped = store.skipped,
            "Loaded metadata"
        );
        Ok(store)
    }

    /// Rows rejected while loading
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl MetadataStore for CsvMetadataStore {
    fn get(&self, id: DocumentId) -> Option<&DocumentMetadata> {
        self.records.get(&id)
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Render one record as a quoted CSV line without the line terminator.
fn render_line(record: &DocumentMetadata) -> Result<String, StorageError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.serialize(record)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let line = String::from_utf8(bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(line.trim_end_matches('\n').to_string())
}

/// Append `record` to the metadata file, writing the header first if the
/// file is new or empty.
///
/// A line identical to one already present is not written again. Returns
/// whether a line was appended.
pub fn append_metadata(path: &Path, record: &DocumentMetadata) -> Result<bool, StorageError> {
    let io_err = |source| StorageError::MetadataIo {
        path: path.to_path_buf(),
        source,
    };

    let line = render_line(record)?;
    let existing = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(io_err(e)),
    };

    if existing.lines().any(|l| l.trim_end() == line) {
        debug!(id = %record.id, "Metadata line already present");
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;

    let mut out = String::new();
    if existing.trim().is_empty() {
        out.push_str(METADATA_HEADER);
        out.push('\n');
    } else if !existing.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&line);
    out.push('\n');
    file.write_all(out.as_bytes()).map_err(io_err)?;

    info!(id = %record.id, title = %record.title, "Metadata appended");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc(id: u64) -> DocumentId {
        DocumentId::new(id).unwrap()
    }

    #[test]
    fn test_append_writes_header_once_and_dedups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metadata.csv");
        let moby = DocumentMetadata::new(doc(2701), "Moby Dick; Or, The Whale")
            .with_author("Herman Melville")
            .with_language("English");

        assert!(append_metadata(&path, &moby).unwrap());
        assert!(!append_metadata(&path, &moby).unwrap());
        assert!(append_metadata(&path, &DocumentMetadata::new(doc(1342), "Pride and Prejudice")).unwrap());

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], METADATA_HEADER);
        assert_eq!(
            lines[1],
            r#""2701","Moby Dick; Or, The Whale","Herman Melville","","","English""#
        );
    }

    #[test]
    fn test_load_roundtrips_appended_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metadata.csv");
        let moby = DocumentMetadata::new(doc(2701), "Moby Dick; Or, The Whale")
            .with_author("Herman Melville");
        append_metadata(&path, &moby).unwrap();

        let store = CsvMetadataStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(doc(2701)), Some(&moby));
        assert_eq!(store.get(doc(1)), None);
    }

    #[test]
    fn test_load_skips_malformed_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metadata.csv");
        fs::write(
            &path,
            format!(
                "{}\n\"1\",\"Ok\",\"A\",\"\",\"\",\"English\"\n\"abc\",\"Bad id\",\"\",\"\",\"\",\"\"\n\"0\",\"Zero\",\"\",\"\",\"\",\"\"\n\"3\",\"Short row\"\n",
                METADATA_HEADER
            ),
        )
        .unwrap();

        let store = CsvMetadataStore::load(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.skipped(), 2);
        assert_eq!(store.get(doc(1)).unwrap().title, "Ok");
        assert_eq!(store.get(doc(3)).unwrap().title, "Short row");
        assert_eq!(store.get(doc(3)).unwrap().author, "");
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = CsvMetadataStore::load(&dir.path().join("missing.csv")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_from_records_first_wins() {
        let store = CsvMetadataStore::from_records([
            DocumentMetadata::new(doc(1), "First"),
            DocumentMetadata::new(doc(1), "Second"),
        ]);
        assert_eq!(store.get(doc(1)).unwrap().title, "First");
    }
}
