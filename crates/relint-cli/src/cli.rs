//! CLI structure and argument parsing.
//!
//! The `relint` binary follows a plain command-subcommand pattern:
//!
//! ```bash
//! # Check a whole project (directory) or a single document (file)
//! relint lint path/to/book
//! relint lint ch01.re --unacceptable-level ERROR
//! relint lint path/to/book --format json
//!
//! # Remove <bookname>, <bookname>-pdf, … build directories
//! relint clean path/to/book
//! ```
//!
//! `--unacceptable-level` sets the reporter's abort threshold and the exit
//! code policy: the process exits non-zero iff parsing aborted or a
//! retained problem reaches the level.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use relint_core::Severity;

use crate::output::OutputFormat;

/// Top-level CLI for the `relint` command.
#[derive(Parser, Debug)]
#[command(name = "relint")]
#[command(version)]
#[command(about = "relint - linter for Re:VIEW book projects", long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a project directory or a single document
    Lint {
        /// Project directory or `.re` document to check
        path: PathBuf,

        /// Severity that aborts the check
        #[arg(
            short,
            long,
            value_enum,
            ignore_case = true,
            default_value_t = Level::Critical
        )]
        unacceptable_level: Level,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Remove the project's temporary build directories
    Clean {
        /// Project directory to clean
        path: PathBuf,
    },
}

/// Severity levels accepted by `--unacceptable-level`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[value(rename_all = "UPPER")]
pub enum Level {
    /// Never abort; only report.
    Critical,
    /// Abort on errors.
    Error,
    /// Abort on warnings and errors.
    Warning,
    /// Abort on anything above tracing noise.
    Info,
    /// Abort on everything.
    Debug,
}

impl Level {
    /// The core severity this level maps to.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Critical => Severity::Critical,
            Self::Error => Severity::Error,
            Self::Warning => Severity::Warning,
            Self::Info => Severity::Info,
            Self::Debug => Severity::Debug,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_lint_with_level() {
        let cli = Cli::try_parse_from([
            "relint",
            "lint",
            "book",
            "--unacceptable-level",
            "ERROR",
        ])
        .unwrap();
        match cli.command {
            Commands::Lint {
                unacceptable_level, ..
            } => assert_eq!(unacceptable_level, Level::Error),
            Commands::Clean { .. } => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn level_defaults_to_critical() {
        let cli = Cli::try_parse_from(["relint", "lint", "book"]).unwrap();
        match cli.command {
            Commands::Lint {
                unacceptable_level, ..
            } => assert_eq!(unacceptable_level, Level::Critical),
            Commands::Clean { .. } => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(
            Cli::try_parse_from(["relint", "lint", "book", "-u", "LOUD"]).is_err()
        );
    }
}
