//! Notes and the notepath text format.
//!
//! A note is one logical record: a path, a list of tags, a list of
//! `name = value` fields and a block of free text. In a text file it looks
//! like this:
//!
//! ```text
//! \===============================================================================
//! \ books/asimov/foundation
//! \ @
//! \
//! \ fiction, scifi
//! \ author = Isaac Asimov
//! \ year   = 1951
//!
//! The first book of the trilogy.
//! ```
//!
//! Header lines start with exactly one backslash. The first one (after any
//! divider) is the path; later ones are tags, fields or a directive. The text
//! starts after the first non-header line and runs until the next header line.
//!
//! - **reader**: line scanner and multi-note parsing
//! - **writer**: serialization back to the text format

mod reader;
mod writer;

pub use reader::*;
pub use writer::*;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// Notes keyed by path.
pub type NoteMap = BTreeMap<String, Note>;

/// A field value, typed once when the field is parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Parse a field literal. Trimmed finite numbers become `Number`.
    pub fn parse(literal: &str) -> Self {
        let literal = literal.trim();
        match parse_number(literal) {
            Some(n) => FieldValue::Number(n),
            None => FieldValue::Text(literal.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::parse(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

/// Numeric literal grammar shared by the parser and the query compiler.
///
/// Only finite values count; `nan` and `inf` stay text.
pub fn parse_number(literal: &str) -> Option<f64> {
    literal.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// What to do with a note when it is saved to the database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Directive {
    /// No directive given; behaves like `Merge`.
    #[default]
    Insert,
    Replace,
    Delete,
    AddOnly,
    Rename(String),
    Merge,
    Unknown(String),
}

impl Directive {
    /// Parse the text that follows `@` on a directive line.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text {
            "" => return Directive::Insert,
            "replace" => return Directive::Replace,
            "delete" => return Directive::Delete,
            "add" => return Directive::AddOnly,
            "merge" => return Directive::Merge,
            _ => {}
        }

        if let Some((word, rest)) = text.split_once(char::is_whitespace) {
            let rest = rest.trim();
            if matches!(word, "rename" | "newpath") && !rest.is_empty() {
                return Directive::Rename(rest.to_string());
            }
        }

        Directive::Unknown(text.to_string())
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Insert => Ok(()),
            Directive::Replace => f.write_str("replace"),
            Directive::Delete => f.write_str("delete"),
            Directive::AddOnly => f.write_str("add"),
            Directive::Merge => f.write_str("merge"),
            Directive::Rename(path) => write!(f, "rename {}", path),
            Directive::Unknown(text) => f.write_str(text),
        }
    }
}

impl Serialize for Directive {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One note.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Note {
    pub path: String,
    /// Text lines without terminators. Never starts with a blank line.
    pub lines: Vec<String>,
    pub tags: Vec<String>,
    pub fields: Vec<(String, FieldValue)>,
    pub directive: Directive,
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.lines == other.lines
            && self.tags == other.tags
            && self.fields == other.fields
    }
}

impl Note {
    /// Create an empty note at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Add a tag unless it is blank or already present.
    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// Add a field unless the same (name, value) pair is already present.
    pub fn add_field(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        if !self.fields.iter().any(|(n, v)| *n == name && *v == value) {
            self.fields.push((name, value));
        }
    }

    /// Every value assigned to `name`, ignoring case.
    pub fn field_values(&self, name: &str) -> Vec<&FieldValue> {
        let sought = name.to_lowercase();
        self.fields
            .iter()
            .filter(|(n, _)| n.to_lowercase() == sought)
            .map(|(_, v)| v)
            .collect()
    }

    /// The note text with every line terminated by `\n`.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    /// Replace the text, dropping leading blank lines.
    pub fn set_text(&mut self, text: &str) {
        self.lines = text
            .lines()
            .skip_while(|line| line.trim().is_empty())
            .map(String::from)
            .collect();
    }

    pub fn word_count(&self) -> usize {
        self.lines
            .iter()
            .map(|line| {
                line.split(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .filter(|word| !word.is_empty())
                    .count()
            })
            .sum()
    }

    /// Merge `other` into this note.
    ///
    /// Texts are concatenated (with a blank line between) only when they
    /// differ, so merging a note with itself never duplicates its text.
    pub fn merge(&mut self, other: &Note) -> Result<()> {
        if self.path != other.path {
            return Err(Error::incompatible_merge(format!(
                "cannot merge notes with different notepaths: {:?} and {:?}",
                self.path, other.path
            )));
        }

        if self.lines != other.lines {
            self.lines.push(String::new());
            self.lines.extend(other.lines.iter().cloned());
        }

        for tag in &other.tags {
            self.add_tag(tag);
        }

        for (name, value) in &other.fields {
            self.add_field(name.clone(), value.clone());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Note {
        let mut note = Note::new("books/asimov");
        note.lines = vec!["First line.".into(), "Second line.".into()];
        note.add_tag("fiction");
        note.add_field("year", FieldValue::parse("1951"));
        note
    }

    #[test]
    fn test_field_value_typing() {
        assert_eq!(FieldValue::parse(" 1980 "), FieldValue::Number(1980.0));
        assert_eq!(FieldValue::parse("2.5"), FieldValue::Number(2.5));
        assert_eq!(
            FieldValue::parse("Isaac Asimov"),
            FieldValue::Text("Isaac Asimov".into())
        );
        assert_eq!(FieldValue::parse("nan"), FieldValue::Text("nan".into()));
        assert_eq!(FieldValue::parse("inf"), FieldValue::Text("inf".into()));
        assert_eq!(FieldValue::Number(1980.0).to_string(), "1980");
        assert_eq!(FieldValue::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_directive_parse() {
        assert_eq!(Directive::parse(""), Directive::Insert);
        assert_eq!(Directive::parse("replace"), Directive::Replace);
        assert_eq!(Directive::parse("delete"), Directive::Delete);
        assert_eq!(Directive::parse("add"), Directive::AddOnly);
        assert_eq!(Directive::parse("merge"), Directive::Merge);
        assert_eq!(
            Directive::parse("rename other path"),
            Directive::Rename("other path".into())
        );
        assert_eq!(
            Directive::parse("newpath some/path"),
            Directive::Rename("some/path".into())
        );
        assert_eq!(Directive::parse("rename"), Directive::Unknown("rename".into()));
        assert_eq!(Directive::parse("frobnicate"), Directive::Unknown("frobnicate".into()));
    }

    #[test]
    fn test_directive_display() {
        assert_eq!(Directive::Insert.to_string(), "");
        assert_eq!(Directive::AddOnly.to_string(), "add");
        assert_eq!(Directive::Rename("x/y".into()).to_string(), "rename x/y");
    }

    #[test]
    fn test_no_duplicate_tags_or_fields() {
        let mut note = sample();
        note.add_tag("fiction");
        note.add_tag("  ");
        note.add_field("year", FieldValue::Number(1951.0));
        note.add_field("year", FieldValue::Number(1952.0));
        assert_eq!(note.tags, vec!["fiction"]);
        assert_eq!(note.fields.len(), 2);
    }

    #[test]
    fn test_equality_ignores_directive() {
        let a = sample();
        let mut b = sample();
        b.directive = Directive::Replace;
        assert_eq!(a, b);

        b.fields.reverse();
        b.add_field("month", FieldValue::parse("May"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_self_merge_is_idempotent() {
        let mut note = sample();
        let copy = note.clone();
        note.merge(&copy).unwrap();
        assert_eq!(note.lines, copy.lines);
        assert_eq!(note.tags, copy.tags);
        assert_eq!(note.fields, copy.fields);
    }

    #[test]
    fn test_merge_appends_text_tags_and_fields() {
        let mut target = sample();
        let mut source = Note::new("books/asimov");
        source.lines = vec!["Merged line.".into()];
        source.add_tag("scifi");
        source.add_tag("fiction");
        source.add_field("year", FieldValue::Number(1951.0));
        source.add_field("author", FieldValue::parse("Asimov"));

        target.merge(&source).unwrap();
        assert_eq!(
            target.lines,
            vec!["First line.", "Second line.", "", "Merged line."]
        );
        assert_eq!(target.tags, vec!["fiction", "scifi"]);
        assert_eq!(target.fields.len(), 2);
        assert_eq!(target.fields[1].0, "author");
    }

    #[test]
    fn test_merge_rejects_different_paths() {
        let mut target = sample();
        let source = Note::new("elsewhere");
        let err = target.merge(&source).unwrap_err();
        assert!(matches!(err, Error::IncompatibleMerge(_)));
    }

    #[test]
    fn test_set_text_drops_leading_blank_lines() {
        let mut note = Note::new("p");
        note.set_text("\n  \nHello\n\nWorld\n");
        assert_eq!(note.lines, vec!["Hello", "", "World"]);
        assert_eq!(note.text(), "Hello\n\nWorld\n");
    }

    #[test]
    fn test_json_shape() {
        let mut note = sample();
        note.add_field("author", FieldValue::parse("Asimov"));
        note.directive = Directive::Merge;

        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["path"], "books/asimov");
        assert_eq!(json["directive"], "merge");
        assert_eq!(json["tags"][0], "fiction");
        assert_eq!(json["fields"][0][1].as_f64(), Some(1951.0));
        assert_eq!(json["fields"][1][1], "Asimov");
    }

    #[test]
    fn test_field_values_and_word_count() {
        let mut note = sample();
        note.add_field("Year", FieldValue::Number(1952.0));
        assert_eq!(note.field_values("YEAR").len(), 2);
        assert_eq!(note.word_count(), 4);
    }
}
