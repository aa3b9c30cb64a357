use duke_sst_core::RichText;

use super::engine::{RedbFile, STMAP, STRINGS};
use super::{EntryCodec, SstStore, StoreConfig, StoreError, StoreResult};
use crate::cache::{CacheStats, LazyLruCache};

const FILE_PREFIX: &str = "duke-sst-strings";

/// Both relations in a single redb database.
///
/// The database file is created on the first write.
pub struct EmbeddedStore {
    config: StoreConfig,
    codec: EntryCodec,
    engine: Option<RedbFile>,
    cache: LazyLruCache<u32, RichText>,
    closed: bool,
}

impl EmbeddedStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            codec: EntryCodec::new(config.encrypt),
            cache: LazyLruCache::new(config.cache_capacity),
            engine: None,
            closed: false,
            config,
        }
    }

    /// Engine for reading; `None` while nothing has been written
    fn reader(&self) -> StoreResult<Option<&RedbFile>> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        Ok(self.engine.as_ref())
    }

    fn writer(&mut self) -> StoreResult<&mut RedbFile> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        if self.engine.is_none() {
            let mut engine = RedbFile::create(FILE_PREFIX, self.config.temp_dir.as_deref())?;
            let init = engine
                .init_table(STRINGS)
                .and_then(|()| engine.init_table(STMAP));
            if let Err(e) = init {
                if let Err(cleanup) = engine.close() {
                    log::warn!("Failed to clean up shared strings store: {}", cleanup);
                }
                return Err(e);
            }
            self.engine = Some(engine);
        }
        self.engine.as_mut().ok_or(StoreError::Closed)
    }
}

impl SstStore for EmbeddedStore {
    fn put_indexed(&mut self, index: u32, entry: &RichText) -> StoreResult<()> {
        let bytes = self.codec.encode(entry)?;
        self.writer()?.put_entry(index, &bytes)?;
        // Replace any stale decoded copy
        if self.cache.contains(&index) {
            self.cache.put(index, entry.clone());
        }
        Ok(())
    }

    fn get_indexed(&mut self, index: u32) -> StoreResult<Option<RichText>> {
        if self.reader()?.is_none() {
            return Ok(None);
        }
        let Self {
            engine,
            codec,
            cache,
            ..
        } = self;
        let Some(engine) = engine.as_ref() else {
            return Ok(None);
        };
        cache.get_or_fetch(index, |&index| {
            engine
                .get_entry(index)?
                .map(|bytes| codec.decode(&bytes))
                .transpose()
        })
    }

    fn put_content_key(&mut self, key: &str, index: u32) -> StoreResult<()> {
        let key = self.codec.content_key(key).into_owned();
        self.writer()?.put_key(&key, index)
    }

    fn get_content_key(&mut self, key: &str) -> StoreResult<Option<u32>> {
        match self.reader()? {
            Some(engine) => engine.get_key(&self.codec.content_key(key)),
            None => Ok(None),
        }
    }

    fn indices_from(&mut self, start: u32, limit: usize) -> StoreResult<Vec<u32>> {
        match self.reader()? {
            Some(engine) => engine.entry_indices_from(start, limit),
            None => Ok(Vec::new()),
        }
    }

    fn close(&mut self) -> StoreResult<()> {
        self.closed = true;
        self.cache.clear();
        match self.engine.take() {
            Some(mut engine) => engine.close(),
            None => Ok(()),
        }
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.cache.stats())
    }
}

impl Drop for EmbeddedStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close shared strings store: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;
    use std::path::Path;

    fn store(dir: &Path, encrypt: bool) -> EmbeddedStore {
        EmbeddedStore::new(StoreConfig {
            temp_dir: Some(dir.to_path_buf()),
            cache_capacity: NonZeroUsize::new(2).unwrap(),
            encrypt,
        })
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_lazy_creation() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path(), false);

        assert_eq!(store.get_indexed(0).unwrap(), None);
        assert_eq!(store.get_content_key("<si/>").unwrap(), None);
        assert!(store.indices_from(0, 10).unwrap().is_empty());
        assert_eq!(files_in(dir.path()), 0);

        store.put_indexed(0, &RichText::new("a")).unwrap();
        assert_eq!(files_in(dir.path()), 1);
    }

    #[test]
    fn test_put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        for encrypt in [false, true] {
            let mut store = store(dir.path(), encrypt);
            for (i, s) in ["a", "b", "c"].iter().enumerate() {
                store.put_indexed(i as u32, &RichText::new(*s)).unwrap();
                store.put_content_key(&format!("key {s}"), i as u32).unwrap();
            }

            assert_eq!(store.get_indexed(2).unwrap(), Some(RichText::new("c")));
            assert_eq!(store.get_indexed(3).unwrap(), None);
            assert_eq!(store.get_content_key("key b").unwrap(), Some(1));
            assert!(store.contains_content_key("key a").unwrap());
            assert!(!store.contains_content_key("key z").unwrap());
            assert_eq!(store.indices_from(1, 10).unwrap(), vec![1, 2]);
        }
    }

    #[test]
    fn test_reads_go_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path(), false);
        store.put_indexed(0, &RichText::new("a")).unwrap();

        store.get_indexed(0).unwrap();
        store.get_indexed(0).unwrap();

        let stats = store.cache_stats().unwrap();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.capacity, 2);
    }

    #[test]
    fn test_close_deletes_and_rejects() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path(), true);
        store.put_indexed(0, &RichText::new("a")).unwrap();

        store.close().unwrap();
        store.close().unwrap();
        assert_eq!(files_in(dir.path()), 0);
        assert!(matches!(store.get_indexed(0), Err(StoreError::Closed)));
        assert!(matches!(
            store.put_indexed(1, &RichText::new("b")),
            Err(StoreError::Closed)
        ));
    }

    #[test]
    fn test_close_unused_store() {
        let mut store = EmbeddedStore::new(StoreConfig::default());
        store.close().unwrap();
    }

    #[test]
    fn test_drop_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = store(dir.path(), false);
            store.put_indexed(0, &RichText::new("a")).unwrap();
        }
        assert_eq!(files_in(dir.path()), 0);
    }
}
