//! Configuration Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An explicitly requested configuration file does not exist.
    #[display("configuration file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// A configuration source could not be parsed or merged.
    #[display("cannot load configuration")]
    Load,
    /// A file extension setting is not of the form `.ext`.
    #[display("invalid file extension {_0:?}; expected a leading dot, e.g. \".woff2\"")]
    InvalidExtension(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::InvalidExtension("woff".to_string()).to_string(),
            "invalid file extension \"woff\"; expected a leading dot, e.g. \".woff2\""
        );
        assert_eq!(ErrorKind::NotFound(PathBuf::from("f2b.toml")).to_string(), "configuration file not found: f2b.toml");
        assert!(!ErrorKind::Load.is_retryable());
    }
}
