//! CLI error type.

use thiserror::Error;

/// Errors surfaced to the command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// A merge, scan or snapshot operation failed.
    #[error(transparent)]
    Merge(#[from] resmerge::MergeError),

    /// Bad command-line input.
    #[error("{0}")]
    Usage(String),
}
