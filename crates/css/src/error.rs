//! Stylesheet Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A stylesheet error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for stylesheet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The stylesheet is structurally broken. Don't retry with the same input.
    #[display("malformed stylesheet at {line}:{column}: {reason}")]
    Parse {
        /// 1-based line of the offending construct.
        line: usize,
        /// 1-based column (in characters) of the offending construct.
        column: usize,
        reason: &'static str,
    },
    /// Full-path matching needs the process working directory, which could
    /// not be determined.
    #[display("cannot determine current working directory")]
    WorkingDirectory,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::WorkingDirectory)
    }
}
