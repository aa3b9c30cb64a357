//! Shared strings table error types

use thiserror::Error;

use crate::store::StoreError;

/// Result type for table operations
pub type SstResult<T> = std::result::Result<T, SstError>;

/// Errors that can occur while building, filling, reading or writing a table
#[derive(Debug, Error)]
pub enum SstError {
    /// Absent payload, zero cache capacity and similar caller mistakes
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No entry is materialized at the index
    #[error("No shared string at index {0}")]
    NotFound(u32),

    /// Operation the streaming table does not offer
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// Malformed shared strings markup
    #[error("Malformed shared strings table: {0}")]
    Format(#[from] duke_sst_xml::XmlError),

    /// IO error on the caller's source or sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// ZIP error while locating the table in a package
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Missing required package part
    #[error("Missing required part: {0}")]
    MissingPart(String),
}

impl SstError {
    /// Whether this is a storage or filesystem failure
    pub fn is_io_failure(&self) -> bool {
        matches!(self, SstError::Io(_) | SstError::Store(_))
    }
}

impl From<quick_xml::Error> for SstError {
    fn from(e: quick_xml::Error) -> Self {
        SstError::Format(duke_sst_xml::XmlError::Xml(e))
    }
}
