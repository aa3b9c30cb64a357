//! # duke-sst-core
//!
//! Payload model for shared string tables.
//!
//! A shared string entry (`<si>` in SpreadsheetML) is either a single plain
//! text node or a sequence of formatting runs, optionally followed by
//! phonetic (ruby) runs for East Asian text. This crate provides:
//! - [`RichText`] - one shared string entry
//! - [`TextRun`] and [`RunProperties`] - formatting runs and their `rPr` children
//! - [`FontStyle`] and [`Color`] - font settings used to build runs
//!
//! ## Example
//!
//! ```rust
//! use duke_sst_core::{FontStyle, RichText};
//!
//! let mut text = RichText::new("Second string");
//! text.apply_font(&FontStyle::new().with_name("Arial").with_bold(true));
//!
//! assert_eq!(text.string(), "Second string");
//! assert_eq!(text.num_formatting_runs(), 1);
//! ```

pub mod color;
pub mod error;
pub mod escape;
pub mod font;
pub mod rich_text;

pub use color::Color;
pub use error::{Error, Result};
pub use escape::decode_excel_escapes;
pub use font::{FontScheme, FontStyle, FontVerticalAlign, Underline};
pub use rich_text::{
    PhoneticProperties, PhoneticRun, RichText, RunProperties, RunProperty, TextRun,
};
