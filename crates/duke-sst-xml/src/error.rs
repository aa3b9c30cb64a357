//! Shared string codec error types

use thiserror::Error;

/// Result type for codec operations
pub type XmlResult<T> = std::result::Result<T, XmlError>;

/// Errors that can occur while reading or writing `<si>` markup
#[derive(Debug, Error)]
pub enum XmlError {
    /// Malformed XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Captured markup is not valid UTF-8
    #[error("Invalid UTF-8 in shared string markup: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Document ended inside an element
    #[error("Unexpected end of document inside <{0}>")]
    UnexpectedEof(String),

    /// Structurally invalid entry
    #[error("Parse error: {0}")]
    Parse(String),
}
