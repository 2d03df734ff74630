//! Core data structures shared across the linter.
//!
//! This module defines the records produced by a parse run: recognised
//! constructs ([`Inline`], [`Block`]), heading records ([`Bookmark`]), and
//! severity-classified diagnostics ([`Problem`], [`Severity`]).
//!
//! Everything here is plain data. The state machines and the project model
//! produce these values; the reporter retains [`Problem`]s; the CLI
//! serializes the lot as JSON when asked to.

use std::fmt;

use serde::Serialize;

/// Severity of a [`Problem`], ordered from least to most severe.
///
/// The ladder mirrors the classic logging levels. `Critical` exists purely
/// as a threshold value ("never abort" / "nothing is unacceptable"): no
/// stored problem ever carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Tracing only.
    Debug,
    /// Stylistic or suggestive findings.
    Info,
    /// Constructs the upstream formatter tolerates but which usually
    /// indicate a bug.
    Warning,
    /// Constructs the upstream formatter would reject.
    Error,
    /// Threshold-only level, above every reportable severity.
    Critical,
}

impl Severity {
    /// Single-letter tag used in human-readable problem listings.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Debug => 'D',
            Self::Info => 'I',
            Self::Warning => 'W',
            Self::Error => 'E',
            Self::Critical => 'C',
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// One diagnostic retained by the reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    /// Classified severity.
    pub severity: Severity,
    /// Name of the source document the problem was found in, when known.
    pub source: Option<String>,
    /// 1-based line number, when the problem is tied to a line.
    pub line: Option<usize>,
    /// Human-readable description.
    pub description: String,
    /// The offending line, trailing whitespace removed.
    pub context: Option<String>,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.severity.letter())?;
        if let Some(source) = &self.source {
            write!(f, " {source}")?;
        }
        match self.line {
            Some(line) => write!(f, " L{line}: {}", self.description)?,
            None => write!(f, " L?: {}", self.description)?,
        }
        if let Some(context) = &self.context {
            write!(f, " (content: \"{context}\")")?;
        }
        Ok(())
    }
}

/// One recognised `@<name>{content}` annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inline {
    /// Annotation name (the part between `@<` and `>`).
    pub name: String,
    /// Content between the braces, escapes resolved.
    pub raw_content: String,
    /// 1-based line number the annotation appeared on.
    pub line: usize,
    /// Character offset of the closing `}` within the line. Absent when the
    /// annotation was synthesised while recovering from a missing `{`.
    pub column: Option<usize>,
}

/// One recognised block construct: `//name[p1][p2]{ … //}` with a body, or
/// the single-line `//name[p1][p2]` form without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    /// Block name (the part right after `//`).
    pub name: String,
    /// Bracketed parameters, in order.
    pub params: Vec<String>,
    /// True when the block carried a `{ … //}` body that was properly
    /// closed.
    pub has_body: bool,
    /// Raw body lines, verbatim (line terminators included), so that their
    /// concatenation reproduces the input slice between the opening line and
    /// the `//}` line byte for byte.
    pub body_lines: Vec<String>,
    /// 1-based line number of the opening line.
    pub line: usize,
}

/// A record for one heading occurrence, or for a synthetic part title.
///
/// The field set derives from PDF outline ("bookmark") dumps: a title, a
/// 1-origin level, and enough source information to find the heading again.
/// When the book has parts, every chapter/section level is shifted down by
/// one and the parts themselves sit at level 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bookmark {
    /// Heading title, surrounding whitespace trimmed.
    pub title: String,
    /// 1-origin outline level, part shift already applied.
    pub level: usize,
    /// Source document the heading appeared in. Absent for synthetic part
    /// bookmarks, which have no source of their own.
    pub source: Option<String>,
    /// 0-based index of the chapter within its document. Present only for
    /// chapters (top-level headings); sections always carry `None`.
    pub chapter_index: Option<usize>,
    /// Whitespace between the `=` run and the title, preserved verbatim.
    pub spacing: String,
    /// True when the heading carried the `column` marker.
    pub is_column: bool,
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_totally_ordered() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn problem_display_includes_source_and_line() {
        let problem = Problem {
            severity: Severity::Error,
            source: Some("ch01.re".into()),
            line: Some(12),
            description: "Empty block name".into(),
            context: Some("//[x]".into()),
        };
        assert_eq!(
            problem.to_string(),
            "[E] ch01.re L12: Empty block name (content: \"//[x]\")"
        );
    }

    #[test]
    fn problem_display_without_line() {
        let problem = Problem {
            severity: Severity::Warning,
            source: None,
            line: None,
            description: "odd".into(),
            context: None,
        };
        assert_eq!(problem.to_string(), "[W] L?: odd");
    }
}
