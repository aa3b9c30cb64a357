//! Prelude module - common imports for duke-sst users
//!
//! ```rust
//! use duke_sst::prelude::*;
//! ```

pub use crate::{
    Backend,
    // Payload types
    Color,
    FontStyle,
    ReadSummary,
    RichText,
    // Main types
    SharedStringsTable,
    SharedStringsTableBuilder,
    // Error types
    SstError,
    SstResult,
    // Storage
    SstStore,
    StringTable,
    TableOptions,
    TextRun,
};
