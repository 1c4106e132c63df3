//! Archive of superseded notes.
//!
//! The archive is a plain notepath text file. Before a note in the database
//! is changed or deleted, the stored version is appended here with one extra
//! `{archive_date}` field. The file is only ever appended to.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::note::{write_note, FieldValue, NoteMap};
use crate::sort::sorted_paths;

/// Default archive file name.
pub const ARCHIVE_FILENAME: &str = "archive.nparch";

/// Field added to every archived note.
pub const ARCHIVE_FIELD: &str = "{archive_date}";

/// Appends notes to the archive file.
#[derive(Debug, Clone)]
pub struct Archiver {
    path: PathBuf,
}

impl Archiver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append clones of `notes`, each stamped with `stamp`, in notepath order.
    pub fn append_notes(&self, notes: &NoteMap, stamp: &str) -> Result<()> {
        if notes.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        for path in sorted_paths(notes.keys()) {
            let mut clone = notes[path].clone();
            clone
                .fields
                .push((ARCHIVE_FIELD.to_string(), FieldValue::Text(stamp.to_string())));
            write_note(&mut writer, &clone)?;
        }
        writer.flush()?;
        Ok(())
    }
}
