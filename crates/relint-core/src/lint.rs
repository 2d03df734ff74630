//! Book-level lint driver.
//!
//! Binds a [`Project`] to a [`DocumentParser`] and walks every catalog
//! document in order: `predef` first, then the chapters part by part (with
//! a synthetic part bookmark before each part) or flat, then `postdef`.
//! One parser instance carries the shared reporter across all documents,
//! so diagnostics and bookmarks come out in catalog order. An abort stops
//! the run; the partial report is still returned with the fatal problem
//! attached.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::parser::DocumentParser;
use crate::project::{Project, Structure};
use crate::report::Reporter;
use crate::types::{Block, Bookmark, Inline, Problem, Severity};

/// Threshold configuration for a lint run.
#[derive(Debug, Clone, Copy)]
pub struct LintOptions {
    /// Problems strictly below this severity are discarded.
    pub ignore_threshold: Severity,
    /// Problems at or above this severity abort the run.
    pub abort_threshold: Severity,
}

impl Default for LintOptions {
    /// Drop `Debug` problems, never abort.
    fn default() -> Self {
        Self {
            ignore_threshold: Severity::Info,
            abort_threshold: Severity::Critical,
        }
    }
}

/// Everything a lint run produced.
#[derive(Debug, Serialize)]
pub struct LintReport {
    /// Retained problems, in catalog-then-input order.
    pub problems: Vec<Problem>,
    /// Bookmarks, including synthetic part bookmarks, in book order.
    pub bookmarks: Vec<Bookmark>,
    /// Every recognised block.
    pub blocks: Vec<Block>,
    /// Every recognised inline annotation.
    pub inlines: Vec<Inline>,
    /// The problem that aborted the run, when one did. Documents after the
    /// aborting one were not attempted.
    pub aborted: Option<Problem>,
}

impl LintReport {
    /// Highest severity among the retained problems and the aborting one.
    #[must_use]
    pub fn max_severity(&self) -> Option<Severity> {
        self.problems
            .iter()
            .map(|p| p.severity)
            .chain(self.aborted.iter().map(|p| p.severity))
            .max()
    }

    /// True when the run aborted or any retained problem reaches `level`.
    #[must_use]
    pub fn exceeds(&self, level: Severity) -> bool {
        self.aborted.is_some() || self.problems.iter().any(|p| p.severity >= level)
    }
}

/// Lint every document of a project, in catalog order.
///
/// # Errors
///
/// Returns [`Error::Io`] / [`Error::Encoding`] for unreadable documents.
/// An abort does *not* surface as an error: the report carries it.
pub fn lint_project(project: &Project, options: &LintOptions) -> Result<LintReport> {
    enum Step<'a> {
        Part(&'a str),
        Document(&'a str, usize),
    }

    let mut steps: Vec<Step<'_>> = Vec::new();
    for document in &project.predef {
        steps.push(Step::Document(document, 0));
    }
    match &project.structure {
        Structure::Parts(parts) => {
            for part in parts {
                steps.push(Step::Part(&part.title));
                for document in &part.documents {
                    steps.push(Step::Document(document, 1));
                }
            }
        },
        Structure::Chapters(chapters) => {
            for document in chapters {
                steps.push(Step::Document(document, 0));
            }
        },
    }
    for document in &project.postdef {
        steps.push(Step::Document(document, 0));
    }

    let reporter = Reporter::new(options.ignore_threshold, options.abort_threshold);
    let mut parser = DocumentParser::new(Some(project), reporter);
    let mut aborted = None;
    for step in steps {
        match step {
            Step::Part(title) => parser.append_part_bookmark(title),
            Step::Document(document, base_level) => {
                debug!(document, base_level, "linting document");
                let path = project.source_dir.join(document);
                match parser.parse_file(&path, base_level, document) {
                    Ok(()) => {},
                    Err(Error::Aborted(problem)) => {
                        info!(%problem, "lint run aborted");
                        aborted = Some(*problem);
                        break;
                    },
                    Err(e) => return Err(e),
                }
            },
        }
    }

    let (problems, bookmarks, blocks, inlines) = parser.into_parts();
    Ok(LintReport {
        problems,
        bookmarks,
        blocks,
        inlines,
        aborted,
    })
}

/// Lint a single document.
///
/// The parent directory is opened as a project when possible, enabling the
/// image checks; a document outside any project is linted without them.
///
/// # Errors
///
/// Returns [`Error::Io`] / [`Error::Encoding`] when the document cannot be
/// read. As with [`lint_project`], an abort is carried in the report.
pub fn lint_file(path: &Path, options: &LintOptions) -> Result<LintReport> {
    let source_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let project = path.parent().and_then(|dir| match Project::open(dir) {
        Ok(project) => Some(project),
        Err(e) => {
            debug!(error = %e, "linting without a project");
            None
        },
    });

    let reporter = Reporter::new(options.ignore_threshold, options.abort_threshold);
    let mut parser = DocumentParser::new(project.as_ref(), reporter);
    let mut aborted = None;
    match parser.parse_file(path, 0, &source_name) {
        Ok(()) => {},
        Err(Error::Aborted(problem)) => aborted = Some(*problem),
        Err(e) => return Err(e),
    }

    let (problems, bookmarks, blocks, inlines) = parser.into_parts();
    Ok(LintReport {
        problems,
        bookmarks,
        blocks,
        inlines,
        aborted,
    })
}
