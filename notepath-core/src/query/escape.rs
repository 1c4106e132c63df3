//! SQL literal escaping and whole-word regex patterns.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Quote `value` as a SQL string literal.
///
/// Embedded single quotes are doubled. A value already wrapped in one pair of
/// single quotes is taken as escaped: only odd-length runs of quotes inside it
/// get one more quote.
pub fn escape_literal(value: &str) -> String {
    let pre_quoted = value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'');
    if !pre_quoted {
        return format!("'{}'", value.replace('\'', "''"));
    }

    let interior = &value[1..value.len() - 1];
    let mut escaped = String::with_capacity(interior.len() + 2);
    let mut run = 0usize;
    for c in interior.chars() {
        if c == '\'' {
            run += 1;
        } else {
            if run % 2 == 1 {
                escaped.push('\'');
            }
            run = 0;
        }
        escaped.push(c);
    }
    if run % 2 == 1 {
        escaped.push('\'');
    }
    format!("'{}'", escaped)
}

/// Case-insensitive regex matching `text` as whole words.
pub fn regexify(text: &str) -> String {
    format!("(?i){}", word_pattern(text))
}

/// Like [`regexify`], but the match must start at the beginning.
pub fn regexify_anchored(text: &str) -> String {
    format!("(?i)^{}", word_pattern(text))
}

/// Literal `text` with whitespace runs matching any whitespace run and word
/// boundaries at word-character ends.
fn word_pattern(text: &str) -> String {
    let escaped = regex::escape(text);
    let body = WHITESPACE.replace_all(&escaped, r"\s+");

    let mut pattern = String::with_capacity(body.len() + 4);
    if text.chars().next().is_some_and(is_word_char) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&body);
    if text.chars().last().is_some_and(is_word_char) {
        pattern.push_str(r"\b");
    }
    pattern
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
