//! Font Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A font error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for font operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The font file is missing or could not be read.
    #[display("cannot access font file: {}", _0.display())]
    FileAccess(#[error(not(source))] PathBuf),
    /// Neither the content signature nor the extension names a known font type.
    #[display("unsupported font type: {_0}")]
    UnsupportedFontType(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::FileAccess(_))
    }
}
