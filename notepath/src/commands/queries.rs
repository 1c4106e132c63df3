//! Saved query management.

use anyhow::Result;
use colored::Colorize;
use notepath_core::Database;
use tracing::{info, warn};

/// Print the names of all saved queries.
pub fn list(db: &Database) -> Result<()> {
    let names = db.saved_query_names()?;

    println!("QUERIES SAVED:");
    for name in &names {
        println!("- \"{}\"", name.cyan());
    }
    match names.len() {
        1 => println!("One query"),
        n => println!("{} queries", n),
    }
    Ok(())
}

/// Remove a saved query; a name that was never saved only warns.
pub fn remove(db: &Database, name: &str) -> Result<()> {
    if db.remove_saved_query(name)? {
        info!(name, "removed saved query");
    } else {
        warn!(name, "no saved query by that name");
    }
    Ok(())
}
