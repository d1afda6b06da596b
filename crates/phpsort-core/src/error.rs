//! Error types for the sorting engine

use thiserror::Error;

/// Errors raised by a [`LineBuffer`](crate::LineBuffer) implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("Line range {start}..{end} out of bounds for buffer of {len} lines")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("Buffer is read-only")]
    ReadOnly,
}

/// Errors that can occur while sorting a buffer
#[derive(Error, Debug)]
pub enum SortError {
    #[error("No syntax tree available for buffer")]
    MissingParser,

    #[error("Buffer language '{found}' does not match parser language '{expected}'")]
    LanguageMismatch { expected: String, found: String },

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Failed to write lines {start}..{end}: {source}")]
    WriteFailure {
        start: usize,
        end: usize,
        #[source]
        source: BufferError,
    },

    #[error("Failed to read buffer: {0}")]
    Buffer(#[from] BufferError),

    #[error("Invalid visibility '{0}', expected one of: public, protected, private")]
    InvalidVisibility(String),
}

impl SortError {
    /// Whether this error aborts the invocation before any mutation
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SortError::WriteFailure { .. })
    }
}
