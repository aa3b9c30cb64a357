//! Error types for duke-sst-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in duke-sst-core
#[derive(Debug, Error)]
pub enum Error {
    /// Character range outside the text, or reversed
    #[error("Invalid character range {start}..{end} for text of length {len}")]
    InvalidRange {
        start: usize,
        end: usize,
        len: usize,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
