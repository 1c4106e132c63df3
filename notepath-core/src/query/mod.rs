//! Compiles search criteria into SQL.
//!
//! A search is a list of criteria, every one of which must hold (there is no
//! OR). Path and text criteria test the `records` table; tag and field
//! criteria test the `tags` table. Each criterion selects a set of record ids
//! and the sets are intersected:
//!
//! ```text
//! SELECT id FROM records WHERE path REGEXP '(?i)\bbooks\b'
//! INTERSECT SELECT id FROM tags WHERE name = 'year' AND value >= 1980
//! ```
//!
//! Path and text terms match whole words, ignoring case. A path term starting
//! with `^` must match at the start of the path. Field terms take one of three
//! forms:
//!
//! - `name OP value` with OP one of `= == != <> < <= > >=`
//! - `name re regex` (the value matches the regular expression)
//! - `name has words` (the value contains the words)

mod escape;

pub use escape::*;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::note::parse_number;

/// Comparison operators accepted in field terms.
pub const OPERATORS: [&str; 8] = ["=", "==", "!=", "<>", "<", "<=", ">", ">="];

/// Prefix marking a path term as anchored to the start of the path.
pub const ROOT_ANCHOR: &str = "^";

static RE_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i) re ").expect("valid regex"));
static HAS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i) has ").expect("valid regex"));

/// Search criteria as given by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Words the path must contain.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Words the text must contain.
    #[serde(default)]
    pub texts: Vec<String>,
    /// Tags the note must have.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Field terms, e.g. `year>=1980`.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Words the path must begin with.
    pub root: Option<String>,
    /// Run this saved query instead of the criteria above.
    pub saved_query: Option<String>,
    /// Save the compiled criteria under this name.
    pub save_as: Option<String>,
}

impl SearchRequest {
    /// Path terms, with the root (if any) appended as an anchored term.
    pub fn path_terms(&self) -> Vec<String> {
        let mut terms = self.paths.clone();
        if let Some(root) = &self.root {
            terms.push(format!("{}{}", ROOT_ANCHOR, root));
        }
        terms
    }

    pub fn has_criteria(&self) -> bool {
        self.root.is_some()
            || [&self.paths, &self.texts, &self.tags, &self.fields]
                .iter()
                .any(|terms| terms.iter().any(|t| !t.trim().is_empty()))
    }
}

/// Table a criterion is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Records,
    Tags,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Records => f.write_str("records"),
            Table::Tags => f.write_str("tags"),
        }
    }
}

/// A single predicate selecting record ids from one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub table: Table,
    pub predicate: String,
}

impl Criterion {
    fn records(predicate: String) -> Self {
        Self { table: Table::Records, predicate }
    }

    fn tags(predicate: String) -> Self {
        Self { table: Table::Tags, predicate }
    }

    fn to_sql(&self) -> String {
        format!("SELECT id FROM {} WHERE {}", self.table, self.predicate)
    }
}

/// Criteria compiled from a [`SearchRequest`], all of which must hold.
#[derive(Debug, Clone, Default)]
pub struct CompiledQuery {
    pub criteria: Vec<Criterion>,
    /// Terms that were dropped, with the reason.
    pub warnings: Vec<String>,
}

impl CompiledQuery {
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// SQL selecting the ids of matching records; empty if there are no criteria.
    pub fn sql(&self) -> String {
        self.criteria
            .iter()
            .map(Criterion::to_sql)
            .collect::<Vec<_>>()
            .join(" INTERSECT ")
    }
}

/// Outcome of compiling one field term.
#[derive(Debug, PartialEq, Eq)]
enum FieldTerm {
    Compiled(String),
    Rejected(String),
    NoMatch,
}

/// Compile the criteria of `request`. Bad field terms are dropped with a warning.
pub fn compile(request: &SearchRequest) -> CompiledQuery {
    let mut query = CompiledQuery::default();

    for term in request.path_terms() {
        if let Some(predicate) = path_predicate(&term) {
            query.criteria.push(Criterion::records(predicate));
        }
    }
    for term in &request.texts {
        if let Some(predicate) = text_predicate(term) {
            query.criteria.push(Criterion::records(predicate));
        }
    }
    for term in &request.fields {
        match field_predicate(term) {
            FieldTerm::Compiled(predicate) => query.criteria.push(Criterion::tags(predicate)),
            FieldTerm::Rejected(message) => {
                warn!("{}", message);
                query.warnings.push(message);
            }
            FieldTerm::NoMatch => {}
        }
    }
    for term in &request.tags {
        if let Some(predicate) = tag_predicate(term) {
            query.criteria.push(Criterion::tags(predicate));
        }
    }

    query
}

fn path_predicate(term: &str) -> Option<String> {
    let term = term.trim();
    let pattern = match term.strip_prefix(ROOT_ANCHOR) {
        Some(rest) if !rest.trim().is_empty() => regexify_anchored(rest.trim()),
        Some(_) => return None,
        None if !term.is_empty() => regexify(term),
        None => return None,
    };
    Some(format!("path REGEXP {}", escape_literal(&pattern)))
}

fn text_predicate(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    Some(format!("text REGEXP {}", escape_literal(&regexify(term))))
}

fn tag_predicate(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    Some(format!("name = {} AND value IS NULL", escape_literal(term)))
}

fn field_predicate(term: &str) -> FieldTerm {
    if term.trim().is_empty() {
        return FieldTerm::NoMatch;
    }

    for parse in [comparison_term, regex_term, has_term] {
        match parse(term) {
            FieldTerm::NoMatch => continue,
            outcome => return outcome,
        }
    }

    FieldTerm::Rejected(format!("BAD FIELD: OPERATOR NOT FOUND: {}", term))
}

/// `name OP value`, split on the first run of `=!<>` characters.
fn comparison_term(term: &str) -> FieldTerm {
    let is_op = |c: char| matches!(c, '=' | '!' | '<' | '>');
    let Some(start) = term.find(is_op) else {
        return FieldTerm::NoMatch;
    };
    let end = term[start..]
        .find(|c: char| !is_op(c))
        .map_or(term.len(), |offset| start + offset);

    let (name, op, value) = (term[..start].trim(), &term[start..end], term[end..].trim());
    if name.is_empty() || value.is_empty() {
        return FieldTerm::NoMatch;
    }
    if !OPERATORS.contains(&op) {
        return FieldTerm::Rejected(format!("BAD FIELD: OPERATOR NOT SUPPORTED: {}", term));
    }

    FieldTerm::Compiled(format!(
        "name = {} AND value {} {}",
        escape_literal(name),
        op,
        sql_value(value)
    ))
}

/// `name re pattern`; the pattern is used as given.
fn regex_term(term: &str) -> FieldTerm {
    split_on_token(term, &RE_TOKEN, |value| value.to_string())
}

/// `name has words`; the words are matched whole, ignoring case.
fn has_term(term: &str) -> FieldTerm {
    split_on_token(term, &HAS_TOKEN, regexify)
}

fn split_on_token(term: &str, token: &Regex, pattern: impl Fn(&str) -> String) -> FieldTerm {
    let Some(found) = token.find(term) else {
        return FieldTerm::NoMatch;
    };
    let name = term[..found.start()].trim();
    let value = term[found.end()..].trim();
    if name.is_empty() || value.is_empty() {
        return FieldTerm::NoMatch;
    }

    FieldTerm::Compiled(format!(
        "name = {} AND value REGEXP {}",
        escape_literal(name),
        escape_literal(&pattern(value))
    ))
}

/// Numbers are compared numerically; anything else as a quoted string.
fn sql_value(value: &str) -> String {
    match parse_number(value) {
        Some(_) => value.to_string(),
        None => escape_literal(value),
    }
}

/// Human-readable description of the criteria in `request`.
///
/// Empty when the request has no criteria.
pub fn summarize(request: &SearchRequest) -> String {
    const WIDTH: usize = 32;

    if let Some(name) = &request.saved_query {
        return format!("SAVED QUERY: {}", name);
    }

    let line = |label: &str, value: &str| format!("{:<width$}\"{}\"", label, value, width = WIDTH);

    let mut parts = Vec::new();
    for path in request.path_terms() {
        match path.strip_prefix(ROOT_ANCHOR) {
            Some(rest) => parts.push(line("--- PATH beginning with words:", rest)),
            None => parts.push(line("--- PATH containing words:", &path)),
        }
    }
    for text in &request.texts {
        parts.push(line("--- TEXT containing:", text));
    }
    for tag in &request.tags {
        parts.push(line("--- TAG word:", tag));
    }
    for field in &request.fields {
        parts.push(line("--- FIELD:", field));
    }

    if parts.is_empty() {
        return String::new();
    }
    parts.insert(0, "SEARCHING FOR NOTES WITH:".to_string());
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(terms: &[&str]) -> SearchRequest {
        SearchRequest {
            fields: terms.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_numeric_field_is_unquoted() {
        let query = compile(&fields(&["year>=1980"]));
        assert_eq!(
            query.criteria,
            vec![Criterion::tags("name = 'year' AND value >= 1980".into())]
        );
        assert_eq!(
            query.sql(),
            "SELECT id FROM tags WHERE name = 'year' AND value >= 1980"
        );
    }

    #[test]
    fn test_text_field_is_quoted() {
        let query = compile(&fields(&["lastname = O'Brien", "rating <> 4.5"]));
        assert_eq!(query.criteria[0].predicate, "name = 'lastname' AND value = 'O''Brien'");
        assert_eq!(query.criteria[1].predicate, "name = 'rating' AND value <> 4.5");
        assert!(query.warnings.is_empty());
    }

    #[test]
    fn test_value_keeps_later_operators() {
        let query = compile(&fields(&["formula=a<b"]));
        assert_eq!(query.criteria[0].predicate, "name = 'formula' AND value = 'a<b'");
    }

    #[test]
    fn test_re_and_has_terms() {
        let query = compile(&fields(&["author RE ^isaac", "title has foundation  empire"]));
        assert_eq!(
            query.criteria[0].predicate,
            "name = 'author' AND value REGEXP '^isaac'"
        );
        assert_eq!(
            query.criteria[1].predicate,
            r"name = 'title' AND value REGEXP '(?i)\bfoundation\s+empire\b'"
        );
    }

    #[test]
    fn test_bad_terms_are_dropped_but_others_compile() {
        let query = compile(&fields(&["year=>1980", "nonsense", "=5", "year<2000"]));
        assert_eq!(query.criteria.len(), 1);
        assert_eq!(query.criteria[0].predicate, "name = 'year' AND value < 2000");
        assert_eq!(
            query.warnings,
            vec![
                "BAD FIELD: OPERATOR NOT SUPPORTED: year=>1980".to_string(),
                "BAD FIELD: OPERATOR NOT FOUND: nonsense".to_string(),
                "BAD FIELD: OPERATOR NOT FOUND: =5".to_string(),
            ]
        );
    }

    #[test]
    fn test_paths_texts_and_tags() {
        let request = SearchRequest {
            paths: vec!["asimov".into()],
            texts: vec!["robot  laws".into()],
            tags: vec!["cat".into(), " ".into()],
            root: Some("books".into()),
            ..Default::default()
        };
        let query = compile(&request);
        let predicates: Vec<&str> = query.criteria.iter().map(|c| c.predicate.as_str()).collect();
        assert_eq!(
            predicates,
            vec![
                r"path REGEXP '(?i)\basimov\b'",
                r"path REGEXP '(?i)^\bbooks\b'",
                r"text REGEXP '(?i)\brobot\s+laws\b'",
                "name = 'cat' AND value IS NULL",
            ]
        );
        assert_eq!(query.criteria[2].table, Table::Records);
        assert_eq!(query.criteria[3].table, Table::Tags);
        assert_eq!(query.sql().matches(" INTERSECT ").count(), 3);
    }

    #[test]
    fn test_empty_request_compiles_to_nothing() {
        let request = SearchRequest {
            paths: vec!["  ".into(), "^".into()],
            ..Default::default()
        };
        let query = compile(&request);
        assert!(query.is_empty());
        assert_eq!(query.sql(), "");
        assert!(!SearchRequest::default().has_criteria());
    }

    #[test]
    fn test_summarize() {
        let request = SearchRequest {
            paths: vec!["asimov".into()],
            tags: vec!["cat".into()],
            root: Some("books".into()),
            ..Default::default()
        };
        let summary = summarize(&request);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "SEARCHING FOR NOTES WITH:");
        assert_eq!(lines[1], "--- PATH containing words:      \"asimov\"");
        assert_eq!(lines[2], "--- PATH beginning with words:  \"books\"");
        assert_eq!(lines[3], "--- TAG word:                   \"cat\"");

        assert_eq!(summarize(&SearchRequest::default()), "");
        let saved = SearchRequest {
            saved_query: Some("recent".into()),
            ..Default::default()
        };
        assert_eq!(summarize(&saved), "SAVED QUERY: recent");
    }
}
