//! The `lint` subcommand: check a project directory or a single document.

use std::path::Path;

use anyhow::{Context, Result, bail};
use relint_core::{LintOptions, Project, Severity, lint_file, lint_project};
use tracing::debug;

use crate::cli::Level;
use crate::output::{OutputFormat, print_report};

/// Run the lint check and print the report.
///
/// Exits the process with code 1 when the run aborted or a retained
/// problem reaches `unacceptable_level`.
pub fn execute(path: &Path, unacceptable_level: Level, format: OutputFormat) -> Result<()> {
    if !path.exists() {
        bail!("\"{}\" does not exist", path.display());
    }

    let options = LintOptions {
        ignore_threshold: Severity::Info,
        abort_threshold: unacceptable_level.severity(),
    };

    let report = if path.is_dir() {
        let source_dir = Project::discover(path, None).with_context(|| {
            format!(
                "failed to detect a project source directory under \"{}\"",
                path.display()
            )
        })?;
        debug!(source_dir = %source_dir.display(), "source directory detected");
        let project = Project::open(&source_dir)?;
        lint_project(&project, &options)?
    } else {
        debug!(path = %path.display(), "checking a single document");
        lint_file(path, &options)?
    };

    print_report(&report, format)?;

    if report.exceeds(unacceptable_level.severity()) {
        std::process::exit(1);
    }
    Ok(())
}
