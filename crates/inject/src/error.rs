//! Injection Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use f2b_css::error::{Error as StylesheetError, ErrorKind as StylesheetErrorKind};
use std::path::PathBuf;

/// An injection error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for injection operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A stylesheet or directory is missing or could not be read.
    #[display("cannot access file: {}", _0.display())]
    FileAccess(#[error(not(source))] PathBuf),
    /// The stylesheet could not be rewritten.
    #[display("cannot rewrite stylesheet: {_0}")]
    Stylesheet(StylesheetErrorKind),
    /// The rewritten stylesheet could not be saved; the content is kept in
    /// the corresponding [`Failure`](crate::Failure).
    #[display("cannot write stylesheet: {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Convert a stylesheet error into an injection error, keeping the
    /// stylesheet crate's `Exn` frame as a child in the error tree.
    #[track_caller]
    pub fn stylesheet(err: StylesheetError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Stylesheet(inner))
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::FileAccess(_) | Self::Write(_) => true,
            Self::Stylesheet(inner) => inner.is_retryable(),
        }
    }
}
