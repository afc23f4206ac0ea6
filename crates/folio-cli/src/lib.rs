//! folio command-line library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Settings, logging, index/status/metadata commands
//! - `repl`: Interactive and one-shot query frontend

pub mod cli;
pub mod commands;
pub mod repl;

pub use cli::{BackendArg, Cli, Commands, EncodingArg, LemmatizerArg, MetadataCommands};
pub use commands::{
    add_metadata, init_logging, load_settings, metadata_record, recorded_lemmatizer, run_index,
    show_status, IndexOverrides,
};
pub use repl::{run_lookup, run_query_session, QueryOptions};
