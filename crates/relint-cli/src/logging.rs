//! Logging bootstrap for the CLI.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// Initialize `tracing` output on stderr.
///
/// The base level comes from the global flags (`-v` → debug, `-q` →
/// error, default warn); a `RELINT_LOG` environment filter overrides it.
pub fn initialize_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::WARN
    };
    let filter = EnvFilter::try_from_env("RELINT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    // try_init: a second call (e.g. from tests) is not an error worth
    // failing the command for.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}
