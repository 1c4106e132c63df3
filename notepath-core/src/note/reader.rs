//! Line scanner for the notepath text format.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use tracing::warn;

use super::{Directive, FieldValue, Note, NoteMap};
use crate::error::Result;

/// Minimum run length for a header line to count as a divider.
const MIN_DIVIDER_LEN: usize = 8;

/// Where the scanner is within the current note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No header line seen yet; plain lines are ignored.
    Preamble,
    /// Inside the header block.
    Header,
    /// At least one text line accepted; a header line now starts the next note.
    Body,
}

/// Result of feeding one line to a [`NoteReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Accepted,
    /// The line begins the next note and was not consumed.
    Rejected,
}

/// Builds a single note from a sequence of lines.
#[derive(Debug)]
pub struct NoteReader {
    note: Note,
    state: ScanState,
}

impl Default for NoteReader {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteReader {
    pub fn new() -> Self {
        Self {
            note: Note::default(),
            state: ScanState::Preamble,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Feed one line (without its terminator).
    pub fn feed(&mut self, line: &str) -> LineOutcome {
        let Some(rest) = line.strip_prefix('\\') else {
            self.feed_text(line);
            return LineOutcome::Accepted;
        };

        // Two or more backslashes: literal text inside a note.
        if rest.starts_with('\\') {
            if self.state != ScanState::Preamble {
                self.state = ScanState::Body;
                self.note.lines.push(line.to_string());
            }
            return LineOutcome::Accepted;
        }

        if self.state == ScanState::Body {
            return LineOutcome::Rejected;
        }

        let content = rest.trim();
        if content.is_empty() {
            return LineOutcome::Accepted;
        }

        // Any non-blank header line, dividers included, opens the note.
        self.state = ScanState::Header;
        if is_divider(content) {
            return LineOutcome::Accepted;
        }

        if self.note.path.is_empty() {
            self.note.path = content.to_string();
        } else {
            self.feed_header(content);
        }
        LineOutcome::Accepted
    }

    /// The note built so far, or `None` if no header line was ever seen.
    pub fn finish(self) -> Option<Note> {
        match self.state {
            ScanState::Preamble => None,
            ScanState::Header | ScanState::Body => Some(self.note),
        }
    }

    fn feed_text(&mut self, line: &str) {
        if self.state == ScanState::Preamble {
            return;
        }
        self.state = ScanState::Body;
        if !self.note.lines.is_empty() || !line.trim().is_empty() {
            self.note.lines.push(line.to_string());
        }
    }

    fn feed_header(&mut self, content: &str) {
        if let Some((name, value)) = content.split_once('=') {
            self.note.add_field(name.trim(), FieldValue::parse(value));
        } else if let Some(directive) = content.strip_prefix('@') {
            self.note.directive = Directive::parse(directive.trim_start());
        } else {
            for tag in content.split([',', ';']) {
                self.note.add_tag(tag);
            }
        }
    }
}

/// Eight or more repeats of a single non-alphanumeric character.
fn is_divider(content: &str) -> bool {
    let mut chars = content.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    !first.is_alphanumeric()
        && chars.all(|c| c == first)
        && content.chars().count() >= MIN_DIVIDER_LEN
}

/// Collects every note from a stream of lines into a [`NoteMap`].
///
/// A note whose path is already in the map is merged into the existing one.
pub struct NoteCollector<'a> {
    notes: &'a mut NoteMap,
    reader: NoteReader,
    suppress_warnings: bool,
}

impl<'a> NoteCollector<'a> {
    pub fn new(notes: &'a mut NoteMap, suppress_warnings: bool) -> Self {
        Self {
            notes,
            reader: NoteReader::new(),
            suppress_warnings,
        }
    }

    pub fn push(&mut self, line: &str) -> Result<()> {
        if self.reader.feed(line) == LineOutcome::Rejected {
            let finished = std::mem::take(&mut self.reader);
            self.collect(finished)?;
            self.reader.feed(line);
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        let finished = std::mem::take(&mut self.reader);
        self.collect(finished)
    }

    fn collect(&mut self, reader: NoteReader) -> Result<()> {
        let Some(note) = reader.finish() else {
            return Ok(());
        };

        match self.notes.get_mut(&note.path) {
            Some(existing) => {
                if !self.suppress_warnings {
                    warn!(path = %note.path, "notepath used more than once");
                }
                existing.merge(&note)?;
            }
            None => {
                self.notes.insert(note.path.clone(), note);
            }
        }
        Ok(())
    }
}

/// Parse every note in `text`.
pub fn parse_notes(text: &str) -> Result<NoteMap> {
    let mut notes = NoteMap::new();
    let mut collector = NoteCollector::new(&mut notes, true);
    for line in text.lines() {
        collector.push(line)?;
    }
    collector.finish()?;
    Ok(notes)
}

/// Read every note in the file at `path` into `notes`.
///
/// A missing file contributes nothing.
pub fn read_notes_from_file(
    path: &Path,
    notes: &mut NoteMap,
    suppress_warnings: bool,
) -> Result<()> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(file = %path.display(), "note file not found");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut collector = NoteCollector::new(notes, suppress_warnings);
    for line in BufReader::new(file).lines() {
        collector.push(&line?)?;
    }
    collector.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(text: &str) -> Note {
        let notes = parse_notes(text).unwrap();
        assert_eq!(notes.len(), 1, "expected exactly one note in {:?}", text);
        notes.into_values().next().unwrap()
    }

    #[test]
    fn test_header_block_and_text() {
        let note = parse_one(
            "\\==========\n\
             \\ books/asimov\n\
             \\ @replace\n\
             \\\n\
             \\ fiction; scifi, fiction\n\
             \\ year = 1951\n\
             \\ author = Isaac Asimov\n\
             \n\
             \n\
             Some text.\n\
             \n\
             More text.\n",
        );
        assert_eq!(note.path, "books/asimov");
        assert_eq!(note.directive, Directive::Replace);
        assert_eq!(note.tags, vec!["fiction", "scifi"]);
        assert_eq!(
            note.fields,
            vec![
                ("year".to_string(), FieldValue::Number(1951.0)),
                ("author".to_string(), FieldValue::Text("Isaac Asimov".into())),
            ]
        );
        assert_eq!(note.lines, vec!["Some text.", "", "More text."]);
    }

    #[test]
    fn test_preamble_is_ignored() {
        let notes = parse_notes("SEARCHING FOR NOTES WITH:\nblah\n\\ a/b\n\nText.\n").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes["a/b"].lines, vec!["Text."]);

        assert!(parse_notes("just some text\n\nmore\n").unwrap().is_empty());
    }

    #[test]
    fn test_header_line_in_body_starts_next_note() {
        let mut reader = NoteReader::new();
        assert_eq!(reader.feed("\\ first"), LineOutcome::Accepted);
        assert_eq!(reader.state(), ScanState::Header);
        assert_eq!(reader.feed(""), LineOutcome::Accepted);
        assert_eq!(reader.state(), ScanState::Body);
        assert_eq!(reader.feed("\\ second"), LineOutcome::Rejected);

        let note = reader.finish().unwrap();
        assert_eq!(note.path, "first");
        assert!(note.lines.is_empty());
    }

    #[test]
    fn test_multiple_notes() {
        let notes = parse_notes("\\ a\n\nA text.\n\\ b\n\\ tag\n\nB text.\n").unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes["a"].lines, vec!["A text."]);
        assert_eq!(notes["b"].tags, vec!["tag"]);
        assert_eq!(notes["b"].lines, vec!["B text."]);
    }

    #[test]
    fn test_double_backslash_is_text() {
        let note = parse_one("\\\\ ignored before note\n\\ p\n\n\\\\ literal\ntext\n");
        assert_eq!(note.lines, vec!["\\\\ literal", "text"]);
    }

    #[test]
    fn test_double_backslash_enters_body() {
        let mut reader = NoteReader::new();
        reader.feed("\\ p");
        reader.feed("\\\\ escaped");
        assert_eq!(reader.state(), ScanState::Body);
        assert_eq!(reader.feed("\\ next"), LineOutcome::Rejected);
    }

    #[test]
    fn test_dividers_and_blank_headers_are_skipped() {
        let note = parse_one("\\\n\\ ########\n\\ path/one\n\\ -------- \n\\ tag\n\nx\n");
        assert_eq!(note.path, "path/one");
        assert_eq!(note.tags, vec!["tag"]);

        // Too short to be a divider, so it becomes the path.
        let note = parse_one("\\ =======\n\nx\n");
        assert_eq!(note.path, "=======");
    }

    #[test]
    fn test_divider_without_path_gives_empty_path() {
        let note = parse_one("\\==========\n\nOrphan text.\n");
        assert_eq!(note.path, "");
        assert_eq!(note.lines, vec!["Orphan text."]);
    }

    #[test]
    fn test_field_beats_directive_and_directive_is_left_trimmed() {
        let note = parse_one("\\ p\n\\ @x=y\n\\ @   rename  q\n\n");
        assert_eq!(note.fields, vec![("@x".to_string(), FieldValue::Text("y".into()))]);
        assert_eq!(note.directive, Directive::Rename("q".into()));
    }

    #[test]
    fn test_duplicate_paths_are_merged() {
        let notes = parse_notes("\\ p\n\\ a\n\nOne.\n\\ p\n\\ b\n\nTwo.\n").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes["p"].tags, vec!["a", "b"]);
        assert_eq!(notes["p"].lines, vec!["One.", "", "Two."]);
    }

    #[test]
    fn test_read_notes_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let first = temp.path().join("one.txt");
        let second = temp.path().join("two.txt");
        std::fs::write(&first, "\\ p\n\nOne.\n").unwrap();
        std::fs::write(&second, "\\ p\n\nTwo.\n\\ q\n\nQ.\n").unwrap();

        let mut notes = NoteMap::new();
        read_notes_from_file(&first, &mut notes, true).unwrap();
        read_notes_from_file(&second, &mut notes, true).unwrap();
        read_notes_from_file(&temp.path().join("missing.txt"), &mut notes, true).unwrap();

        assert_eq!(notes.len(), 2);
        assert_eq!(notes["p"].lines, vec!["One.", "", "Two."]);
    }
}
