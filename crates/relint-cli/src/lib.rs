//! relint CLI - linter for Re:VIEW book projects.
//!
//! Thin front-end over `relint-core`: argument parsing, logging bootstrap,
//! report rendering, exit codes. Command implementations live in
//! [`commands`].

use anyhow::Result;
use clap::Parser;

/// Argument structure
pub mod cli;
/// Subcommand implementations
pub mod commands;
/// Logging bootstrap
pub mod logging;
/// Report rendering
pub mod output;

use cli::{Cli, Commands};

/// Execute the relint CLI with the current process arguments.
///
/// # Errors
///
/// Returns an error when logging initialization or the selected command
/// fails.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize_logging(&cli)?;
    match cli.command {
        Commands::Lint {
            ref path,
            unacceptable_level,
            format,
        } => commands::lint::execute(path, unacceptable_level, format),
        Commands::Clean { ref path } => commands::clean::execute(path),
    }
}
