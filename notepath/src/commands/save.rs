//! Save notes from text files into the database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use notepath_core::note::read_notes_from_file;
use notepath_core::{Database, NoteMap, SaveReport};

use crate::config::Config;

/// Read every note in `files` and save them as one batch.
///
/// Notes from all files are gathered first, so a notepath that appears in
/// more than one file is merged before it reaches the database.
pub fn execute(db: &Database, files: &[PathBuf], config: &Config, quiet: bool) -> Result<SaveReport> {
    if !quiet {
        println!("SAVING NOTES INTO DATABASE FROM FILES:");
    }

    let mut notes = NoteMap::new();
    for (number, file) in files.iter().enumerate() {
        if !quiet {
            println!("{}.  {}", number + 1, file.display());
        }
        read_notes_from_file(file, &mut notes, config.output.suppress_duplicate_warnings)
            .with_context(|| format!("Failed to read notes from {}", file.display()))?;
    }

    let report = db.save_notes(&notes).context("Failed to save notes")?;

    if !quiet {
        println!(
            "{} {} saved ({} new, {} merged, {} replaced, {} deleted, {} archived)",
            "✓".green(),
            report.total(),
            report.inserted,
            report.merged,
            report.replaced,
            report.deleted,
            report.archived
        );
        println!();
    }
    Ok(report)
}
