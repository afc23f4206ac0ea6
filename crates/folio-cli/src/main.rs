//! folio
//!
//! Incremental inverted index over a directory of plain-text books, with an
//! exact-lemma query frontend.
//!
//! # Usage
//!
//! ```bash
//! folio index [--backend structured|flat|both] [--lemmatizer case-fold|english-stemmer]
//! folio query [--backend json|tsv] [--context]
//! folio lookup <TERM> [--backend json|tsv] [--context]
//! folio status
//! folio metadata add <ID> <TITLE> [--author ...]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (<config_dir>/folio/config.toml, then --config)
//! 3. Environment variables (FOLIO_*)
//! 4. CLI flags

use std::io;

use anyhow::Result;
use clap::Parser;

use folio_cli::{
    add_metadata, init_logging, load_settings, metadata_record, run_index, run_lookup,
    run_query_session, show_status, Cli, Commands, IndexOverrides, MetadataCommands, QueryOptions,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(
        cli.config.as_deref(),
        cli.log_level.as_deref(),
        cli.data_dir.as_deref(),
    )?;
    init_logging(&settings)?;

    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Index {
            backend,
            books_dir,
            lemmatizer,
            stop_on_source_error,
        } => {
            let overrides = IndexOverrides {
                backend: backend.map(Into::into),
                books_dir,
                lemmatizer: lemmatizer.map(Into::into),
                stop_on_source_error,
            };
            run_index(&settings, overrides, &mut stdout)?;
        }
        Commands::Query {
            backend,
            context,
            no_color,
        } => {
            let options = QueryOptions {
                context,
                color: !no_color,
            };
            run_query_session(
                &settings,
                backend.map(Into::into),
                options,
                io::stdin().lock(),
                &mut stdout,
            )?;
        }
        Commands::Lookup {
            term,
            backend,
            context,
            no_color,
        } => {
            let options = QueryOptions {
                context,
                color: !no_color,
            };
            run_lookup(&settings, backend.into(), &term, options, &mut stdout)?;
        }
        Commands::Status => {
            show_status(&settings, &mut stdout)?;
        }
        Commands::Metadata { command } => match command {
            MetadataCommands::Add {
                id,
                title,
                author,
                release_date,
                updated,
                language,
            } => {
                let record = metadata_record(id, title, author, release_date, updated, language)?;
                add_metadata(&settings, &record, &mut stdout)?;
            }
        },
    }

    Ok(())
}
