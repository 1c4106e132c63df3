//! Serialization of notes to the notepath text format.

use std::fmt;
use std::io::{self, Write};

use super::Note;

/// Preferred maximum width of a line in a note file.
pub const LINE_WIDTH: usize = 80;

/// Field names longer than this do not widen the name column.
const MAX_FIELD_NAME_WIDTH: usize = 24;

const TAG_SEPARATOR: &str = ", ";

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\\{}", "=".repeat(LINE_WIDTH - 1))?;
        writeln!(f, "\\ {}", self.path)?;
        writeln!(f, "\\ @{}", self.directive)?;

        if !self.tags.is_empty() || !self.fields.is_empty() {
            writeln!(f, "\\")?;

            for line in pack_tags(&self.tags) {
                writeln!(f, "\\ {}", line)?;
            }

            let width = self
                .fields
                .iter()
                .map(|(name, _)| name.chars().count())
                .max()
                .unwrap_or(0)
                .min(MAX_FIELD_NAME_WIDTH);
            for (name, value) in &self.fields {
                writeln!(f, "\\ {:<width$} = {}", name, value, width = width)?;
            }
        }

        writeln!(f)?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Join tags onto as few header lines as possible without exceeding
/// [`LINE_WIDTH`]. A single tag is never split, even if it is wider.
fn pack_tags(tags: &[String]) -> Vec<String> {
    const PREFIX: usize = "\\ ".len();

    let mut lines = Vec::new();
    let mut current = String::new();
    for tag in tags.iter().filter(|t| !t.is_empty()) {
        if !current.is_empty() {
            let width = PREFIX
                + current.chars().count()
                + TAG_SEPARATOR.len()
                + tag.chars().count();
            if width > LINE_WIDTH {
                lines.push(std::mem::take(&mut current));
            } else {
                current.push_str(TAG_SEPARATOR);
            }
        }
        current.push_str(tag);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Write `note` in text format.
pub fn write_note<W: Write>(writer: &mut W, note: &Note) -> io::Result<()> {
    write!(writer, "{}", note)
}
