//! CLI argument definitions using clap derive macros.
//!
//! All query options match whole words and ignore case, so "cat" matches
//! "CAT" but not "catalog".

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use notepath_core::SearchRequest;

/// Move notes between text files and a SQLite database.
///
/// All query options match whole words and ignore case, so "cat" matches
/// "CAT" but does not match "catalog".
#[derive(Parser, Debug, Default)]
#[command(name = "notepath")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print SQLite engine details and where notepath keeps its files
    #[arg(short = 'd', long)]
    pub database: bool,

    /// Print only the paths of matching notes
    #[arg(short = 'P', long)]
    pub paths_only: bool,

    /// Print matching notes as JSON
    #[arg(short = 'J', long)]
    pub json: bool,

    /// Notes whose path begins with these words
    #[arg(short = 'r', long, value_name = "PART")]
    pub root: Option<String>,

    /// Notes whose path contains these words
    #[arg(short = 'p', long = "path", value_name = "PHRASE", num_args = 1.., action = ArgAction::Append)]
    pub paths: Vec<String>,

    /// Notes whose text contains these words
    #[arg(short = 't', long = "text", value_name = "PHRASE", num_args = 1.., action = ArgAction::Append)]
    pub texts: Vec<String>,

    /// Notes with this tag
    #[arg(short = 'g', long = "tag", value_name = "WORD", num_args = 1.., action = ArgAction::Append)]
    pub tags: Vec<String>,

    /// Notes with a matching field, e.g. "year>=1980", "author has asimov", "isbn re ^0"
    #[arg(short = 'f', long = "field", value_name = "X=Y", num_args = 1.., action = ArgAction::Append)]
    pub fields: Vec<String>,

    /// Save this search under a name
    #[arg(short = 'n', long, value_name = "NAME")]
    pub name_query: Option<String>,

    /// Run the search saved under this name
    #[arg(short = 'q', long, value_name = "NAME")]
    pub query: Option<String>,

    /// List the names of saved searches
    #[arg(short = 'l', long)]
    pub list_queries: bool,

    /// Remove the search saved under this name
    #[arg(short = 'x', long, value_name = "NAME")]
    pub remove_query: Option<String>,

    /// Save the notes in these files into the database
    #[arg(short = 's', long, value_name = "FILE", num_args = 1.., action = ArgAction::Append)]
    pub save_notes: Vec<PathBuf>,
}

impl Cli {
    /// The search described by the query options.
    pub fn search_request(&self) -> SearchRequest {
        SearchRequest {
            paths: self.paths.clone(),
            texts: self.texts.clone(),
            tags: self.tags.clone(),
            fields: self.fields.clone(),
            root: self.root.clone(),
            saved_query: self.query.clone(),
            save_as: self.name_query.clone(),
        }
    }
}
