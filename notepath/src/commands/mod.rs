//! Command implementations.

pub mod doctor;
pub mod queries;
pub mod save;
pub mod search;

use anyhow::{Context, Result};
use notepath_core::Database;

use crate::cli::Cli;
use crate::config::Config;

/// Run everything `cli` asks for, in order: save files, remove a saved
/// query, then search.
pub fn execute(cli: &Cli, config: &Config) -> Result<()> {
    config.ensure_dirs()?;

    if cli.database {
        return doctor::execute(config);
    }

    let db = open_database(config)?;

    if cli.list_queries {
        return queries::list(&db);
    }

    // Save first, so the search can include the saved notes.
    if !cli.save_notes.is_empty() {
        save::execute(&db, &cli.save_notes, config, cli.json)?;
    }

    if let Some(name) = &cli.remove_query {
        queries::remove(&db, name)?;
    }

    search::execute(&db, cli)
}

pub fn open_database(config: &Config) -> Result<Database> {
    let path = config.database_path();
    Database::open(&path, config.archive_path())
        .with_context(|| format!("Failed to open database {}", path.display()))
}
