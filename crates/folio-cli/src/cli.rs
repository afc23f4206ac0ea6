//! CLI argument parsing for folio.
//!
//! Global flags (`--config`, `--log-level`, `--data-dir`) override every
//! other configuration source.

use clap::{Parser, Subcommand, ValueEnum};
use folio_types::{BackendSelection, LemmatizerKind, ShardEncoding};

/// folio: incremental inverted index over a directory of plain-text books
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (in addition to <config_dir>/folio/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override the data directory
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index every document above the checkpoint
    Index {
        /// Backend(s) to build (default from config)
        #[arg(short, long, value_enum)]
        backend: Option<BackendArg>,

        /// Override the books directory
        #[arg(long)]
        books_dir: Option<String>,

        /// Override the lemmatizer
        #[arg(long, value_enum)]
        lemmatizer: Option<LemmatizerArg>,

        /// Stop at the first unreadable document instead of continuing
        #[arg(long)]
        stop_on_source_error: bool,
    },

    /// Interactive query session; ends at the sentinel word or end of input
    Query {
        /// Index to load; prompts for json/tsv when omitted
        #[arg(short, long, value_enum)]
        backend: Option<EncodingArg>,

        /// Print matching source lines
        #[arg(long)]
        context: bool,

        /// Disable colored highlighting in context lines
        #[arg(long)]
        no_color: bool,
    },

    /// Look up a single term and exit
    Lookup {
        /// Term to look up
        term: String,

        /// Index to load (default: structured)
        #[arg(short, long, value_enum, default_value = "structured")]
        backend: EncodingArg,

        /// Print matching source lines
        #[arg(long)]
        context: bool,

        /// Disable colored highlighting in context lines
        #[arg(long)]
        no_color: bool,
    },

    /// Show checkpoints and shard counts per backend
    Status,

    /// Metadata file commands
    Metadata {
        #[command(subcommand)]
        command: MetadataCommands,
    },
}

/// Metadata subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum MetadataCommands {
    /// Append a metadata row (skipped if an identical row exists)
    Add {
        /// Document id
        id: u64,

        /// Title
        title: String,

        #[arg(long, default_value = "")]
        author: String,

        #[arg(long, default_value = "")]
        release_date: String,

        #[arg(long, default_value = "")]
        updated: String,

        #[arg(long, default_value = "")]
        language: String,
    },
}

/// Backend selection for indexing
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    #[value(alias = "json")]
    Structured,
    #[value(alias = "tsv")]
    Flat,
    Both,
}

impl From<BackendArg> for BackendSelection {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Structured => BackendSelection::Structured,
            BackendArg::Flat => BackendSelection::Flat,
            BackendArg::Both => BackendSelection::Both,
        }
    }
}

/// Single backend for querying
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingArg {
    #[value(alias = "json")]
    Structured,
    #[value(alias = "tsv")]
    Flat,
}

impl From<EncodingArg> for ShardEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Structured => ShardEncoding::Structured,
            EncodingArg::Flat => ShardEncoding::Flat,
        }
    }
}

/// Lemmatizer selection
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LemmatizerArg {
    CaseFold,
    EnglishStemmer,
}

impl From<LemmatizerArg> for LemmatizerKind {
    fn from(arg: LemmatizerArg) -> Self {
        match arg {
            LemmatizerArg::CaseFold => LemmatizerKind::CaseFold,
            LemmatizerArg::EnglishStemmer => LemmatizerKind::EnglishStemmer,
        }
    }
}
