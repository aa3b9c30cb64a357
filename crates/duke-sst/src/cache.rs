//! LRU cache in front of the on-disk index store.
//!
//! The cache is never authoritative: a miss is resolved through the fetch
//! closure passed to [`LazyLruCache::get_or_fetch`], and the fetched value
//! is reinserted as most-recently-used.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::error::{SstError, SstResult};

/// Default number of decoded entries kept in memory
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Bounded least-recently-used cache that fills itself on miss.
pub struct LazyLruCache<K: Hash + Eq, V> {
    cache: LruCache<K, V>,
    hits: u64,
    misses: u64,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
}

impl<K: Hash + Eq, V: Clone> LazyLruCache<K, V> {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a cache from an unchecked capacity; zero is rejected
    pub fn with_capacity(capacity: usize) -> SstResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            SstError::InvalidArgument("cache capacity must be at least 1".into())
        })?;
        Ok(Self::new(capacity))
    }

    /// Look up a key, marking it most-recently-used on hit.
    ///
    /// A miss never evicts anything.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match self.cache.get(key) {
            Some(v) => {
                self.hits += 1;
                Some(v)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert or update a key as most-recently-used.
    ///
    /// Returns the least-recently-used key if it had to be evicted.
    pub fn put(&mut self, key: K, value: V) -> Option<K> {
        match self.cache.push(key, value) {
            // `push` also hands back the old entry when the key was already present
            Some((evicted, _)) if !self.cache.contains(&evicted) => Some(evicted),
            _ => None,
        }
    }

    /// Return the cached value, or fetch, cache and return it.
    ///
    /// `Ok(None)` from the fetch is passed through and not cached.
    pub fn get_or_fetch<E, F>(&mut self, key: K, fetch: F) -> Result<Option<V>, E>
    where
        F: FnOnce(&K) -> Result<Option<V>, E>,
    {
        if let Some(v) = self.get(&key) {
            return Ok(Some(v.clone()));
        }
        let fetched = fetch(&key)?;
        if let Some(v) = &fetched {
            self.put(key, v.clone());
        }
        Ok(fetched)
    }

    /// Check for a key without touching its recency
    pub fn contains(&self, key: &K) -> bool {
        self.cache.contains(key)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    /// Drop every cached entry
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.cache.len(),
            capacity: self.capacity(),
        }
    }
}
