//! Search the database and print the notes found.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Local};
use notepath_core::query::summarize;
use notepath_core::sort::sorted_paths;
use notepath_core::time::{now_local, readable_timespan, timestamp_for_journal};
use notepath_core::{Database, Note, NoteMap};

use crate::cli::Cli;

const LABEL_WIDTH: usize = 19;

pub fn execute(db: &Database, cli: &Cli) -> Result<()> {
    let request = cli.search_request();

    let started = Instant::now();
    let notes = db.search(&request)?;
    let elapsed = started.elapsed();

    let paths = sorted_paths(notes.keys());

    if cli.json {
        let json = if cli.paths_only {
            serde_json::to_string_pretty(&paths)?
        } else {
            let sorted: Vec<&Note> = paths.iter().map(|path| &notes[*path]).collect();
            serde_json::to_string_pretty(&sorted)?
        };
        println!("{}", json);
        return Ok(());
    }

    let summary = summarize(&request);
    if summary.is_empty() {
        println!("NO SEARCH WAS MADE.");
    } else {
        println!("{}", summary);
        println!();
        print_stats(db.path(), &notes, elapsed);
        println!();
    }

    for path in paths {
        if cli.paths_only {
            println!("{}", path);
        } else {
            println!("{}", notes[path]);
        }
    }
    Ok(())
}

fn print_stats(db_path: &Path, notes: &NoteMap, elapsed: Duration) {
    let line = |label: &str, value: String| println!("{:<width$}{}", label, value, width = LABEL_WIDTH);

    let metadata = std::fs::metadata(db_path).ok();
    let size = metadata
        .as_ref()
        .map(|m| readable_filesize(m.len()))
        .unwrap_or_default();
    let modified = metadata
        .and_then(|m| m.modified().ok())
        .map(|when| readable_moddate(DateTime::<Local>::from(when)))
        .unwrap_or_default();
    let words: usize = notes.values().map(Note::word_count).sum();

    line("DATABASE SIZE:", size);
    line("DATABASE MODIFIED:", modified);
    line("WHEN SEARCHED:", timestamp_for_journal(&now_local()));
    line("SEARCH DURATION:", format!("{:.4} seconds", elapsed.as_secs_f64()));
    line("NOTES FOUND:", group_thousands(notes.len()));
    line("WORD COUNT:", group_thousands(words));
}

/// e.g. `512 bytes`, `1.5 KB`.
fn readable_filesize(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["", "K", "M", "G", "T", "P", "E", "Z"] {
        if size < 1024.0 {
            let text = format!("{:.1} {}B", size, unit);
            return match text.strip_suffix(".0 B") {
                Some(whole) => format!("{} bytes", whole),
                None => text,
            };
        }
        size /= 1024.0;
    }
    format!("{:.1} YiB", size)
}

/// e.g. `Tuesday 17 September 2019 at 8:16 AM (2 hours ago)`.
fn readable_moddate(when: DateTime<Local>) -> String {
    let age = (now_local() - when).num_milliseconds() as f64 / 1000.0;
    format!("{} ({})", timestamp_for_journal(&when), readable_timespan(age))
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
