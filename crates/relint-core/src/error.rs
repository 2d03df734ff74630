//! Error types and result alias for relint-core.
//!
//! Most linting findings are *not* errors in this sense: they flow through
//! the [`Reporter`](crate::report::Reporter) as [`Problem`](crate::types::Problem)s.
//! This enum covers the conditions that stop a run: I/O failures, broken
//! project metadata, undecodable sources, and the reporter's abort
//! threshold firing. The abort is carried as a value rather than by
//! unwinding, so every layer can propagate it with `?` and the driver can
//! tell "aborted" apart from "soft failure".

use thiserror::Error;

use crate::types::Problem;

/// Result alias used throughout relint-core.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for relint-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// An underlying filesystem operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A source document is not valid UTF-8. The parser does not attempt to
    /// continue on a corrupt stream.
    #[error("{source_name} is not valid UTF-8")]
    Encoding {
        /// Name of the undecodable document.
        source_name: String,
    },

    /// The book configuration is missing or unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No usable catalog (new or legacy format) was found.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// The directory does not look like a book project at all.
    #[error("Project error: {0}")]
    Project(String),

    /// A problem at or above the abort threshold stopped parsing. The
    /// offending problem rides along.
    #[error("parsing aborted: {0}")]
    Aborted(Box<Problem>),
}
