//! Error types for columna operations

use thiserror::Error;

/// Result type for columna operations
pub type Result<T> = std::result::Result<T, ColumnaError>;

/// Errors that can occur during columna operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColumnaError {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Size mismatch between a declared dimension and the actual data
    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },

    /// I/O failure while reading or writing a matrix file
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ColumnaError {
    fn from(err: std::io::Error) -> Self {
        ColumnaError::Io(err.to_string())
    }
}
