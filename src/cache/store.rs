//! Thread-safe wrapper around the LRU store.

use std::sync::Mutex;

use super::lru::LruCache;
use super::view::ByteView;

/// Snapshot of a store's occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached entries.
    pub entries: usize,
    /// Bytes charged against the budget (keys + values).
    pub used_bytes: u64,
}

/// Mutex-guarded LRU with lazy construction.
///
/// The inner LRU is only allocated on the first `add`; a `get` against an
/// untouched store answers "not found" without allocating anything.
/// The mutex is a leaf lock: the critical sections are pure in-memory work.
pub struct CacheStore {
    cache_bytes: u64,
    inner: Mutex<Option<LruCache>>,
}

impl CacheStore {
    pub fn new(cache_bytes: u64) -> Self {
        Self {
            cache_bytes,
            inner: Mutex::new(None),
        }
    }

    pub fn add(&self, key: &str, value: ByteView) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner
            .get_or_insert_with(|| LruCache::new(self.cache_bytes, None))
            .add(key, value);
    }

    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.as_mut()?.get(key)
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache lock poisoned");
        match inner.as_ref() {
            Some(lru) => CacheStats {
                entries: lru.len(),
                used_bytes: lru.nbytes(),
            },
            None => CacheStats::default(),
        }
    }
}
