//! # relint-core
//!
//! Core functionality for relint — a linter for the Re:VIEW-style `.re`
//! book markup.
//!
//! The crate parses every source document of a book project (or a single
//! document), reports structural and syntactic problems at selectable
//! severity, cross-checks references between inline annotations and block
//! definitions, and verifies that image references resolve to files on
//! disk. It validates only: nothing is rendered and nothing is written.
//!
//! ## Architecture
//!
//! - **Reporter** — severity-classified diagnostic sink with ignore/abort
//!   thresholds
//! - **State machines** — a per-character recogniser for `@<name>{…}`
//!   annotations and a per-line recogniser for `//name[…]{ … //}` blocks
//! - **Document parser** — orchestrates both over one document, detects
//!   headings, and runs per-construct checkers
//! - **Project model** — catalog discovery (two historical formats),
//!   chapter ordering, draft detection, image association
//! - **Lint driver** — binds parser and project in catalog order
//!
//! ## Quick start
//!
//! ```rust
//! use relint_core::{DocumentParser, Reporter};
//!
//! let mut parser = DocumentParser::new(None, Reporter::default());
//! parser.parse_str("= Title\nhello\n", 0, "intro.re")?;
//! assert!(parser.problems().is_empty());
//! assert_eq!(parser.bookmarks()[0].title, "Title");
//! # Ok::<(), relint_core::Error>(())
//! ```

/// Per-line recogniser for block constructs
pub mod block;
/// Per-construct validation rules
pub mod checkers;
/// Error types and result alias
pub mod error;
/// Per-character recogniser for inline annotations
pub mod inline;
/// Book-level lint driver
pub mod lint;
/// Document parser
pub mod parser;
/// Book project model
pub mod project;
/// Severity-classified diagnostic sink
pub mod report;
/// Core data types
pub mod types;

pub use block::{BlockScanner, BlockStep};
pub use error::{Error, Result};
pub use inline::{InlineScanner, InlineStep};
pub use lint::{LintOptions, LintReport, lint_file, lint_project};
pub use parser::DocumentParser;
pub use project::{
    BookAttributes, ImageResolution, Part, Project, ProjectImage, ProjectOptions, Structure,
};
pub use report::Reporter;
pub use types::{Block, Bookmark, Inline, Problem, Severity};
