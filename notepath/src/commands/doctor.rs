//! Database and configuration diagnostics.

use anyhow::Result;
use colored::Colorize;

use super::open_database;
use crate::config::Config;

pub fn execute(config: &Config) -> Result<()> {
    println!("{}", "notepath Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    // Check config file
    print!("  Config file: ");
    let config_path = Config::config_path();
    if config_path.exists() {
        println!("{} {}", "✓".green(), config_path.display());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    print!("  Archive: ");
    let archive_path = config.archive_path();
    if archive_path.exists() {
        println!("{} {}", "✓".green(), archive_path.display());
    } else {
        println!("{} {}", "○ not written yet".yellow(), archive_path.display());
    }

    print!("  Database: ");
    let db = match open_database(config) {
        Ok(db) => {
            println!("{} {}", "✓".green(), db.path().display());
            db
        }
        Err(e) => {
            println!("{}", format!("✗ {:#}", e).red());
            return Err(e);
        }
    };

    println!("  Notes: {}", db.note_count()?);
    println!("  Saved queries: {}", db.saved_query_names()?.len());

    let engine = db.engine_info()?;
    println!();
    println!("Database engine: SQLite [version {}].", engine.version);
    println!("Available options:");
    for option in &engine.compile_options {
        println!("--- {}", option);
    }

    Ok(())
}
