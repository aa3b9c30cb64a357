//! # duke-sst-xml
//!
//! Codec between SpreadsheetML shared string markup and [`RichText`].
//!
//! - [`read_plain_text`] pulls only the literal text of an `<si>` off a
//!   streaming reader (compact mode).
//! - [`capture_element`] buffers a whole element as markup, and
//!   [`parse_rich_text`] turns that markup into a complete [`RichText`]
//!   (full mode).
//! - [`to_xml`] writes the canonical `<si>` form, which doubles as the
//!   deduplication key of an entry.
//!
//! [`RichText`]: duke_sst_core::RichText

pub mod error;
pub mod read;
pub mod write;

pub use error::{XmlError, XmlResult};
pub use read::{capture_element, parse_rich_text, read_plain_text};
pub use write::{escape_xml, to_xml, write_rich_text};

/// Main SpreadsheetML namespace (transitional)
pub const NS_SPREADSHEETML: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Content type of the shared strings part in `[Content_Types].xml`
pub const SHARED_STRINGS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
