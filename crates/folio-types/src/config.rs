//! Configuration loading for folio.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `<config_dir>/folio/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::encoding::ShardEncoding;
use crate::error::FolioError;

/// Which postings backends an indexing run or query session uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendSelection {
    #[default]
    Structured,
    Flat,
    /// Index into both encodings, each with its own checkpoint
    Both,
}

impl BackendSelection {
    /// Encodings covered by this selection, structured first.
    pub fn encodings(&self) -> Vec<ShardEncoding> {
        match self {
            BackendSelection::Structured => vec![ShardEncoding::Structured],
            BackendSelection::Flat => vec![ShardEncoding::Flat],
            BackendSelection::Both => vec![ShardEncoding::Structured, ShardEncoding::Flat],
        }
    }
}

/// Lemmatization strategy applied after token cleaning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LemmatizerKind {
    /// Lowercase only
    #[default]
    CaseFold,
    /// Snowball English stemmer
    EnglishStemmer,
}

impl LemmatizerKind {
    /// Config and on-disk name
    pub fn as_str(&self) -> &'static str {
        match self {
            LemmatizerKind::CaseFold => "case_fold",
            LemmatizerKind::EnglishStemmer => "english_stemmer",
        }
    }
}

impl fmt::Display for LemmatizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LemmatizerKind {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "case_fold" => Ok(LemmatizerKind::CaseFold),
            "english_stemmer" => Ok(LemmatizerKind::EnglishStemmer),
            other => Err(FolioError::InvalidInput(format!(
                "Unknown lemmatizer '{}' (expected case_fold or english_stemmer)",
                other
            ))),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base directory; relative paths below resolve against it
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Directory of `<id>.txt` documents
    #[serde(default = "default_books_dir")]
    pub books_dir: String,

    /// Root of the postings shards (`structured/` and `flat/` live here)
    #[serde(default = "default_index_dir")]
    pub index_dir: String,

    /// Directory holding one checkpoint file per backend
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,

    /// Metadata CSV path
    #[serde(default = "default_metadata_path")]
    pub metadata_path: String,

    /// Backends used by `index` and, when not overridden, by `query`
    #[serde(default)]
    pub backend: BackendSelection,

    #[serde(default)]
    pub lemmatizer: LemmatizerKind,

    /// Word that ends an interactive query session
    #[serde(default = "default_sentinel")]
    pub sentinel: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Keep indexing later documents when one document cannot be read
    #[serde(default = "default_continue_on_source_error")]
    pub continue_on_source_error: bool,
}

fn default_data_dir() -> String {
    ProjectDirs::from("", "", "folio")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./folio-data"))
        .to_string_lossy()
        .to_string()
}

fn default_books_dir() -> String {
    "books".to_string()
}

fn default_index_dir() -> String {
    "index".to_string()
}

fn default_checkpoint_dir() -> String {
    "checkpoints".to_string()
}

fn default_metadata_path() -> String {
    "metadata.csv".to_string()
}

fn default_sentinel() -> String {
    "exit".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_continue_on_source_error() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            books_dir: default_books_dir(),
            index_dir: default_index_dir(),
            checkpoint_dir: default_checkpoint_dir(),
            metadata_path: default_metadata_path(),
            backend: BackendSelection::default(),
            lemmatizer: LemmatizerKind::default(),
            sentinel: default_sentinel(),
            log_level: default_log_level(),
            continue_on_source_error: default_continue_on_source_error(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (`<config_dir>/folio/config.toml`)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (`FOLIO_*`, nested keys split on `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, FolioError> {
        let config_dir = ProjectDirs::from("", "", "folio")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("data_dir", default_data_dir())
            .map_err(|e| FolioError::Config(e.to_string()))?
            .set_default("books_dir", default_books_dir())
            .map_err(|e| FolioError::Config(e.to_string()))?
            .set_default("index_dir", default_index_dir())
            .map_err(|e| FolioError::Config(e.to_string()))?
            .set_default("checkpoint_dir", default_checkpoint_dir())
            .map_err(|e| FolioError::Config(e.to_string()))?
            .set_default("metadata_path", default_metadata_path())
            .map_err(|e| FolioError::Config(e.to_string()))?
            .set_default("sentinel", default_sentinel())
            .map_err(|e| FolioError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| FolioError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // FOLIO_DATA_DIR, FOLIO_BACKEND, FOLIO_CONTINUE_ON_SOURCE_ERROR, ...
        builder = builder.add_source(
            Environment::with_prefix("FOLIO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| FolioError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| FolioError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), FolioError> {
        if self.sentinel.trim().is_empty() {
            return Err(FolioError::Config("sentinel must not be empty".to_string()));
        }
        if self.data_dir.trim().is_empty() {
            return Err(FolioError::Config("data_dir must not be empty".to_string()));
        }
        Ok(())
    }

    /// Settings rooted at an explicit data directory, other fields default.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        }
    }

    /// Resolve a configured path: `~/` expands to the home directory and
    /// relative paths are taken relative to `data_dir`.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let expanded = expand_home(path);
        if expanded.is_absolute() {
            return expanded;
        }
        expand_home(&self.data_dir).join(expanded)
    }

    pub fn books_path(&self) -> PathBuf {
        self.resolve(&self.books_dir)
    }

    pub fn index_path(&self) -> PathBuf {
        self.resolve(&self.index_dir)
    }

    /// Shard root for one encoding
    pub fn shard_root(&self, encoding: ShardEncoding) -> PathBuf {
        self.index_path().join(encoding.dir_name())
    }

    /// Checkpoint file for one encoding
    pub fn checkpoint_path(&self, encoding: ShardEncoding) -> PathBuf {
        self.resolve(&self.checkpoint_dir)
            .join(encoding.checkpoint_file_name())
    }

    /// File naming the lemmatizer that built one encoding's shards
    pub fn lemmatizer_record_path(&self, encoding: ShardEncoding) -> PathBuf {
        self.resolve(&self.checkpoint_dir)
            .join(encoding.lemmatizer_file_name())
    }

    pub fn metadata_file(&self) -> PathBuf {
        self.resolve(&self.metadata_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.sentinel, "exit");
        assert_eq!(settings.backend, BackendSelection::Structured);
        assert_eq!(settings.lemmatizer, LemmatizerKind::CaseFold);
        assert!(settings.continue_on_source_error);
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert!(!settings.sentinel.is_empty());
    }

    #[test]
    fn test_paths_resolve_against_data_dir() {
        let settings = Settings::with_data_dir("/srv/folio");
        assert_eq!(settings.books_path(), PathBuf::from("/srv/folio/books"));
        assert_eq!(
            settings.shard_root(ShardEncoding::Flat),
            PathBuf::from("/srv/folio/index/flat")
        );
        assert_eq!(
            settings.checkpoint_path(ShardEncoding::Structured),
            PathBuf::from("/srv/folio/checkpoints/last_id_structured.txt")
        );
        assert_eq!(settings.metadata_file(), PathBuf::from("/srv/folio/metadata.csv"));
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let mut settings = Settings::with_data_dir("/srv/folio");
        settings.books_dir = "/mnt/gutenberg".to_string();
        assert_eq!(settings.books_path(), PathBuf::from("/mnt/gutenberg"));
    }

    #[test]
    fn test_backend_selection_encodings() {
        assert_eq!(
            BackendSelection::Both.encodings(),
            vec![ShardEncoding::Structured, ShardEncoding::Flat]
        );
        assert_eq!(BackendSelection::Flat.encodings(), vec![ShardEncoding::Flat]);
    }

    #[test]
    fn test_lemmatizer_kind_round_trips_its_name() {
        for kind in [LemmatizerKind::CaseFold, LemmatizerKind::EnglishStemmer] {
            assert_eq!(kind.to_string().parse::<LemmatizerKind>().unwrap(), kind);
        }
        assert_eq!(
            "English-Stemmer\n".parse::<LemmatizerKind>().unwrap(),
            LemmatizerKind::EnglishStemmer
        );
        assert!("porter".parse::<LemmatizerKind>().is_err());
        assert_eq!(
            Settings::with_data_dir("/srv/folio").lemmatizer_record_path(ShardEncoding::Flat),
            PathBuf::from("/srv/folio/checkpoints/lemmatizer_flat.txt")
        );
    }

    #[test]
    fn test_validate_rejects_empty_sentinel() {
        let mut settings = Settings::default();
        settings.sentinel = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_from_toml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(
            &path,
            "data_dir = \"/tmp/folio\"\nbackend = \"both\"\nlemmatizer = \"english_stemmer\"\nsentinel = \"quit\"\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path.to_string_lossy())).unwrap();
        assert_eq!(settings.backend, BackendSelection::Both);
        assert_eq!(settings.lemmatizer, LemmatizerKind::EnglishStemmer);
        assert_eq!(settings.sentinel, "quit");
    }
}
