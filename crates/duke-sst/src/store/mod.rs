//! Backing stores for the shared strings table.
//!
//! A store holds two relations: `index -> entry`, ordered by index, and
//! `content key -> index`, used for deduplication. Both backends keep their
//! data in scratch files and put a [`LazyLruCache`] of decoded entries in
//! front of index lookups.
//!
//! - [`EmbeddedStore`] - one redb database holding both relations
//! - [`FileBackedStore`] - append-only record file for entries, plus a
//!   separate redb database for the dedup map
//!
//! [`LazyLruCache`]: crate::cache::LazyLruCache

use std::borrow::Cow;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use thiserror::Error;

use duke_sst_core::RichText;
use duke_sst_xml::{parse_rich_text, to_xml, XmlError};

use crate::cache::{CacheStats, DEFAULT_CACHE_CAPACITY};
use crate::cipher::EntryCipher;

mod embedded;
mod engine;
mod file_backed;

pub use embedded::EmbeddedStore;
pub use file_backed::FileBackedStore;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage engine and filesystem failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Cipher error: {0}")]
    Cipher(String),

    /// A stored entry could not be decoded
    #[error("Corrupt stored entry: {0}")]
    Codec(#[from] XmlError),

    /// Append-only storage received an index other than the next one
    #[error("Out of order insert: expected index {expected}, got {actual}")]
    OutOfOrder { expected: u32, actual: u32 },

    #[error("Store is closed")]
    Closed,
}

/// Storage contract behind a shared strings table.
///
/// Lookups take `&mut self` because they may fill the cache. Reads before
/// the first write succeed and find nothing; every operation after
/// [`SstStore::close`] other than `close` itself fails with
/// [`StoreError::Closed`].
pub trait SstStore: Send {
    /// Store the entry at `index`
    fn put_indexed(&mut self, index: u32, entry: &RichText) -> StoreResult<()>;

    /// Fetch the entry at `index`, if one was stored
    fn get_indexed(&mut self, index: u32) -> StoreResult<Option<RichText>>;

    /// Map a canonical content key to an index
    fn put_content_key(&mut self, key: &str, index: u32) -> StoreResult<()>;

    /// Index mapped to a canonical content key
    fn get_content_key(&mut self, key: &str) -> StoreResult<Option<u32>>;

    fn contains_content_key(&mut self, key: &str) -> StoreResult<bool> {
        Ok(self.get_content_key(key)?.is_some())
    }

    /// Up to `limit` stored indices `>= start`, ascending
    fn indices_from(&mut self, start: u32, limit: usize) -> StoreResult<Vec<u32>>;

    /// Release the engine and delete scratch files. Idempotent.
    fn close(&mut self) -> StoreResult<()>;

    /// Entry cache statistics, for backends that cache
    fn cache_stats(&self) -> Option<CacheStats> {
        None
    }
}

/// Settings shared by the built-in backends
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory for scratch files (default: OS temp dir)
    pub temp_dir: Option<PathBuf>,
    /// Number of decoded entries kept in memory
    pub cache_capacity: NonZeroUsize,
    /// Encrypt entries and content keys at rest
    pub encrypt: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            cache_capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            encrypt: false,
        }
    }
}

/// Converts entries and content keys to their stored bytes
pub(crate) struct EntryCodec {
    cipher: Option<EntryCipher>,
}

impl EntryCodec {
    pub fn new(encrypt: bool) -> Self {
        Self {
            cipher: encrypt.then(EntryCipher::generate),
        }
    }

    pub fn encode(&self, entry: &RichText) -> StoreResult<Vec<u8>> {
        let markup = to_xml(entry);
        match &self.cipher {
            Some(cipher) => cipher.seal(markup.as_bytes()),
            None => Ok(markup.into_bytes()),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> StoreResult<RichText> {
        let plain = match &self.cipher {
            Some(cipher) => Cow::Owned(cipher.open(bytes)?),
            None => Cow::Borrowed(bytes),
        };
        let markup = std::str::from_utf8(&plain)
            .map_err(|e| StoreError::Codec(XmlError::Parse(format!("stored entry is not UTF-8: {e}"))))?;
        Ok(parse_rich_text(markup)?)
    }

    pub fn content_key<'a>(&self, key: &'a str) -> Cow<'a, [u8]> {
        match &self.cipher {
            Some(cipher) => Cow::Owned(cipher.content_key(key).to_vec()),
            None => Cow::Borrowed(key.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duke_sst_core::FontStyle;

    #[test]
    fn test_codec_plain() {
        let codec = EntryCodec::new(false);
        let mut text = RichText::new("Second string");
        text.apply_font(&FontStyle::new().with_bold(true));

        let bytes = codec.encode(&text).unwrap();
        assert_eq!(bytes, to_xml(&text).into_bytes());
        assert_eq!(codec.decode(&bytes).unwrap(), text);
        assert_eq!(codec.content_key("<si/>").as_ref(), b"<si/>");
    }

    #[test]
    fn test_codec_encrypted() {
        let codec = EntryCodec::new(true);
        let text = RichText::new("hidden");

        let bytes = codec.encode(&text).unwrap();
        assert_ne!(bytes, to_xml(&text).into_bytes());
        assert_eq!(codec.decode(&bytes).unwrap(), text);

        let key = codec.content_key("<si><t>hidden</t></si>");
        assert_eq!(key.len(), 32);
        assert_eq!(key, codec.content_key("<si><t>hidden</t></si>"));
    }

    #[test]
    fn test_codec_rejects_garbage() {
        let codec = EntryCodec::new(false);
        assert!(matches!(codec.decode(&[0xff, 0xfe]), Err(StoreError::Codec(_))));
        assert!(matches!(codec.decode(b"<t>x</t>"), Err(StoreError::Codec(_))));
    }
}
