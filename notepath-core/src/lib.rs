//! notepath-core - Core library for notepath
//!
//! This crate provides everything the notepath CLI builds on:
//!
//! - **note**: The note model and the notepath text format
//! - **db**: SQLite note store with save directives and saved queries
//! - **query**: Search criteria compiled to SQL
//! - **archive**: Append-only archive of superseded notes
//! - **sort**: Notepath ordering

pub mod archive;
pub mod db;
pub mod error;
pub mod note;
pub mod query;
pub mod sort;
pub mod time;

// Re-export commonly used types
pub use db::{Database, SaveReport};
pub use error::{Error, Result};
pub use note::{Directive, FieldValue, Note, NoteMap};
pub use query::SearchRequest;
