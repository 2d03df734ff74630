//! The `clean` subcommand: remove the project's temporary build
//! directories.

use std::path::Path;

use anyhow::{Context, Result, bail};
use relint_core::Project;

/// Remove `<bookname>`, `<bookname>-pdf`, `<bookname>-epub`, and
/// `<bookname>-log` under the project's source directory.
pub fn execute(path: &Path) -> Result<()> {
    if !path.is_dir() {
        bail!("\"{}\" is not a directory", path.display());
    }
    let source_dir = Project::discover(path, None).with_context(|| {
        format!(
            "failed to detect a project source directory under \"{}\"",
            path.display()
        )
    })?;
    let project = Project::open(&source_dir)?;
    project.remove_temp_dirs()?;
    Ok(())
}
