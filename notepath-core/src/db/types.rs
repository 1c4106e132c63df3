//! Database types for notepath-core.

use serde::Serialize;

/// What a call to `save_notes` did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    /// Notes stored at a path that had no note.
    pub inserted: usize,
    /// Notes merged into the note already at their path.
    pub merged: usize,
    /// Notes that replaced the note already at their path.
    pub replaced: usize,
    pub deleted: usize,
    pub renamed: usize,
    /// Stored notes copied to the archive before being changed or deleted.
    pub archived: usize,
}

impl SaveReport {
    pub fn total(&self) -> usize {
        self.inserted + self.merged + self.replaced + self.deleted
    }
}

/// SQLite engine details.
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub version: String,
    pub compile_options: Vec<String>,
}
