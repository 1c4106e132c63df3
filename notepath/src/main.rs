//! notepath - notes as plain text, searchable in SQLite
//!
//! Moves notes between text files and a SQLite database, and searches the
//! database by path, text, tag and field.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Initialize tracing; diagnostics go to stderr, notes to stdout
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::from_default_env().add_directive("notepath=info".parse()?))
        .init();

    // Load configuration
    let config = config::Config::load()?;

    commands::execute(&cli, &config)
}
