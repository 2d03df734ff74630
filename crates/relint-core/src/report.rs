//! Severity-classified diagnostic sink.
//!
//! The [`Reporter`] decouples problem *collection* from problem *policy*:
//! the parser and the state machines report whatever they find, and the two
//! thresholds decide per problem whether it is discarded, retained, or
//! fatal. Callers pick "collect everything" or "fail on the first error"
//! without the parser changing at all.

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Problem, Severity};

/// Diagnostic sink with an ignore threshold and an abort threshold.
///
/// Problems strictly below `ignore_threshold` are forgotten. Problems at or
/// above `abort_threshold` abort the run by returning
/// [`Error::Aborted`]. Everything in between is appended to the retained
/// list, in report order.
#[derive(Debug)]
pub struct Reporter {
    ignore_threshold: Severity,
    abort_threshold: Severity,
    problems: Vec<Problem>,
}

impl Default for Reporter {
    /// A reporter that drops `Debug` problems and never aborts, matching
    /// the linter's stock configuration.
    fn default() -> Self {
        Self::new(Severity::Info, Severity::Critical)
    }
}

impl Reporter {
    /// Create a reporter with the given thresholds.
    #[must_use]
    pub const fn new(ignore_threshold: Severity, abort_threshold: Severity) -> Self {
        Self {
            ignore_threshold,
            abort_threshold,
            problems: Vec::new(),
        }
    }

    /// Classify one problem.
    ///
    /// Returns `Ok(None)` when the problem fell below the ignore threshold,
    /// `Ok(Some(_))` with a reference to the stored problem otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Aborted`] carrying the problem when its severity
    /// reaches the abort threshold.
    pub fn report(
        &mut self,
        severity: Severity,
        source: Option<&str>,
        line: Option<usize>,
        description: impl Into<String>,
        context: Option<&str>,
    ) -> Result<Option<&Problem>> {
        let problem = Problem {
            severity,
            source: source.map(str::to_owned),
            line,
            description: description.into(),
            context: context.map(str::to_owned),
        };
        if severity < self.ignore_threshold {
            debug!(%problem, "ignored");
            return Ok(None);
        }
        if severity >= self.abort_threshold {
            return Err(Error::Aborted(Box::new(problem)));
        }
        self.problems.push(problem);
        Ok(self.problems.last())
    }

    /// Report at `Error` severity.
    pub fn error(
        &mut self,
        source: Option<&str>,
        line: Option<usize>,
        description: impl Into<String>,
        context: Option<&str>,
    ) -> Result<()> {
        self.report(Severity::Error, source, line, description, context)
            .map(|_| ())
    }

    /// Report at `Warning` severity.
    pub fn warning(
        &mut self,
        source: Option<&str>,
        line: Option<usize>,
        description: impl Into<String>,
        context: Option<&str>,
    ) -> Result<()> {
        self.report(Severity::Warning, source, line, description, context)
            .map(|_| ())
    }

    /// Report at `Info` severity.
    pub fn info(
        &mut self,
        source: Option<&str>,
        line: Option<usize>,
        description: impl Into<String>,
        context: Option<&str>,
    ) -> Result<()> {
        self.report(Severity::Info, source, line, description, context)
            .map(|_| ())
    }

    /// Report at `Debug` severity.
    pub fn debug(
        &mut self,
        source: Option<&str>,
        line: Option<usize>,
        description: impl Into<String>,
        context: Option<&str>,
    ) -> Result<()> {
        self.report(Severity::Debug, source, line, description, context)
            .map(|_| ())
    }

    /// The retained problems, in report order.
    #[must_use]
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Highest severity among the retained problems, if any were retained.
    #[must_use]
    pub fn max_severity(&self) -> Option<Severity> {
        self.problems.iter().map(|p| p.severity).max()
    }

    /// Consume the reporter, yielding the retained problems.
    #[must_use]
    pub fn into_problems(self) -> Vec<Problem> {
        self.problems
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn retains_at_or_above_ignore_threshold() {
        let mut reporter = Reporter::new(Severity::Info, Severity::Critical);
        reporter
            .debug(Some("a.re"), Some(1), "trace", None)
            .expect("below abort");
        reporter
            .info(Some("a.re"), Some(2), "note", None)
            .expect("below abort");
        reporter
            .error(Some("a.re"), Some(3), "broken", None)
            .expect("below abort");
        let severities: Vec<_> = reporter.problems().iter().map(|p| p.severity).collect();
        assert_eq!(severities, vec![Severity::Info, Severity::Error]);
    }

    #[test]
    fn aborts_at_abort_threshold() {
        let mut reporter = Reporter::new(Severity::Debug, Severity::Error);
        reporter
            .warning(Some("a.re"), Some(1), "iffy", None)
            .expect("warning stays below the threshold");
        let err = reporter
            .error(Some("a.re"), Some(2), "fatal", None)
            .expect_err("error must abort");
        match err {
            Error::Aborted(problem) => {
                assert_eq!(problem.severity, Severity::Error);
                assert_eq!(problem.line, Some(2));
            },
            other => panic!("unexpected error: {other}"),
        }
        // The aborting problem is not retained.
        assert_eq!(reporter.problems().len(), 1);
    }

    #[test]
    fn ignore_threshold_wins_over_abort_threshold() {
        // Filtering happens before classification: a problem below the
        // ignore threshold is dropped even when it reaches the abort one.
        let mut reporter = Reporter::new(Severity::Warning, Severity::Debug);
        reporter
            .info(None, None, "quiet", None)
            .expect("ignored problems never abort");
        assert!(reporter.problems().is_empty());
    }

    #[test]
    fn lowering_ignore_threshold_only_adds_problems() {
        let feed = |reporter: &mut Reporter| {
            for (severity, desc) in [
                (Severity::Debug, "d"),
                (Severity::Info, "i"),
                (Severity::Warning, "w"),
            ] {
                reporter
                    .report(severity, Some("a.re"), Some(1), desc, None)
                    .expect("no abort configured");
            }
        };
        let mut strict = Reporter::new(Severity::Warning, Severity::Critical);
        let mut lax = Reporter::new(Severity::Debug, Severity::Critical);
        feed(&mut strict);
        feed(&mut lax);
        for problem in strict.problems() {
            assert!(lax.problems().contains(problem));
        }
        assert!(lax.problems().len() > strict.problems().len());
    }
}
