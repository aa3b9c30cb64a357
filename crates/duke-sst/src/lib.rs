//! # duke-sst
//!
//! Disk-backed shared strings table for writing and reading large
//! spreadsheets.
//!
//! Cell text in an XLSX workbook is stored once in the shared strings part
//! (`xl/sharedStrings.xml`) and referenced by index. [`SharedStringsTable`]
//! interns entries into dense indices while keeping the entries themselves
//! in scratch files, so memory stays bounded by the cache size rather than
//! by the document.
//!
//! ## Features
//!
//! - Deduplicating inserts with stable, insertion-ordered indices
//! - Two interchangeable backends: an embedded redb database, or an
//!   append-only record file plus a redb dedup map
//! - LRU cache of decoded entries in front of the store
//! - Streaming `<sst>` read and write, in compact (text only) or full
//!   (formatting runs kept) mode
//! - Optional encryption of scratch files with a per-table key
//! - Loading the shared strings part straight from an XLSX package
//!
//! ## Example
//!
//! ```rust,no_run
//! use duke_sst::prelude::*;
//!
//! let mut table = SharedStringsTable::builder()
//!     .backend(Backend::FileBacked)
//!     .cache_capacity(500)
//!     .build()?;
//!
//! let mut bold = RichText::new("Second string");
//! bold.apply_font(&FontStyle::new().with_bold(true));
//!
//! table.add_shared_string_item("First string")?;
//! table.add_entry(&bold, true)?;
//!
//! let mut xml = Vec::new();
//! table.write_to(&mut xml)?;
//! table.close()?;
//! # Ok::<(), SstError>(())
//! ```

pub mod cache;
pub mod cipher;
pub mod error;
pub mod options;
pub mod package;
pub mod prelude;
pub mod scratch;
pub mod store;
pub mod table;

pub use error::{SstError, SstResult};
pub use options::{Backend, SharedStringsTableBuilder, TableOptions};
pub use package::find_shared_strings_part;
pub use store::{EmbeddedStore, FileBackedStore, SstStore, StoreConfig, StoreError, StoreResult};
pub use table::{ReadSummary, SharedStringsTable, StringTable};

// Re-export payload types
pub use duke_sst_core::{
    Color, FontScheme, FontStyle, FontVerticalAlign, PhoneticProperties, PhoneticRun, RichText,
    RunProperties, RunProperty, TextRun, Underline,
};
