//! Table options and builder

use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::{SstError, SstResult};
use crate::store::{EmbeddedStore, FileBackedStore, SstStore, StoreConfig};
use crate::table::SharedStringsTable;

/// Storage backend behind a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// One redb database for entries and the dedup map
    #[default]
    Embedded,
    /// Append-only record file for entries, redb for the dedup map
    FileBacked,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Embedded => "embedded",
            Backend::FileBacked => "file-backed",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = SstError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "embedded" => Ok(Backend::Embedded),
            "file-backed" | "file" => Ok(Backend::FileBacked),
            other => Err(SstError::InvalidArgument(format!(
                "unknown backend '{}', expected 'embedded' or 'file-backed'",
                other
            ))),
        }
    }
}

/// Options for building a shared strings table
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Storage backend (default: embedded)
    pub backend: Backend,
    /// Decoded entries kept in memory (default: 100, must be at least 1)
    pub cache_capacity: usize,
    /// Keep formatting runs when reading documents (default: false)
    pub full_format: bool,
    /// Encrypt scratch file contents (default: false)
    pub encrypt_temp_files: bool,
    /// Directory for scratch files (default: OS temp dir)
    pub temp_dir: Option<PathBuf>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            backend: Backend::Embedded,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            full_format: false,
            encrypt_temp_files: false,
            temp_dir: None,
        }
    }
}

impl TableOptions {
    /// Store configuration; fails on a zero cache capacity
    pub fn store_config(&self) -> SstResult<StoreConfig> {
        let cache_capacity = NonZeroUsize::new(self.cache_capacity).ok_or_else(|| {
            SstError::InvalidArgument("cache capacity must be at least 1".into())
        })?;
        Ok(StoreConfig {
            temp_dir: self.temp_dir.clone(),
            cache_capacity,
            encrypt: self.encrypt_temp_files,
        })
    }

    /// Instantiate the configured backend
    pub fn open_store(&self) -> SstResult<Box<dyn SstStore>> {
        let config = self.store_config()?;
        Ok(match self.backend {
            Backend::Embedded => Box::new(EmbeddedStore::new(config)),
            Backend::FileBacked => Box::new(FileBackedStore::new(config)),
        })
    }
}

/// Builder for [`SharedStringsTable`]
#[derive(Default)]
pub struct SharedStringsTableBuilder {
    options: TableOptions,
    store: Option<Box<dyn SstStore>>,
}

impl SharedStringsTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing options
    pub fn from_options(options: TableOptions) -> Self {
        Self {
            options,
            store: None,
        }
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.options.backend = backend;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.options.cache_capacity = capacity;
        self
    }

    pub fn full_format(mut self, full_format: bool) -> Self {
        self.options.full_format = full_format;
        self
    }

    pub fn encrypt_temp_files(mut self, encrypt: bool) -> Self {
        self.options.encrypt_temp_files = encrypt;
        self
    }

    pub fn temp_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.options.temp_dir = Some(dir.into());
        self
    }

    /// Use a custom store; backend, cache and encryption options are ignored
    pub fn store(mut self, store: Box<dyn SstStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> SstResult<SharedStringsTable> {
        let store = match self.store {
            Some(store) => store,
            None => self.options.open_store()?,
        };
        Ok(SharedStringsTable::with_store(store, self.options.full_format))
    }
}

impl SharedStringsTable {
    pub fn builder() -> SharedStringsTableBuilder {
        SharedStringsTableBuilder::new()
    }

    /// Build a table from options
    pub fn with_options(options: TableOptions) -> SstResult<Self> {
        SharedStringsTableBuilder::from_options(options).build()
    }
}
