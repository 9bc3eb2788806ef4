//! Byte-budgeted LRU store.
//!
//! Keys are tracked in a recency queue (front = most recently used) alongside
//! a key→value map; the two structures always hold exactly the same key set.
//! Not thread-safe — owned and locked by [`super::store::CacheStore`].

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use super::view::ByteView;

/// Invoked with each entry as it is evicted.
///
/// Runs while the cache lock is held, so it must not block or call back
/// into the cache.
pub type EvictionCallback = Box<dyn FnMut(&str, &ByteView) + Send>;

/// Bounded key-value store that evicts least-recently-used entries once the
/// byte budget is exceeded.
pub struct LruCache {
    /// Maximum total bytes; 0 means unbounded.
    max_bytes: u64,
    /// Current total: sum of `key.len() + value.len()` over all entries.
    nbytes: u64,
    /// Recency order. Front = most recent, back = next eviction candidate.
    order: VecDeque<String>,
    entries: HashMap<String, ByteView>,
    on_evicted: Option<EvictionCallback>,
}

impl LruCache {
    pub fn new(max_bytes: u64, on_evicted: Option<EvictionCallback>) -> Self {
        Self {
            max_bytes,
            nbytes: 0,
            order: VecDeque::new(),
            entries: HashMap::new(),
            on_evicted,
        }
    }

    /// Inserts or replaces a value, then evicts from the cold end until the
    /// store is back under budget.
    pub fn add(&mut self, key: &str, value: ByteView) {
        if let Some(old) = self.entries.get_mut(key) {
            self.nbytes -= old.len() as u64;
            self.nbytes += value.len() as u64;
            *old = value;
            self.promote(key);
        } else {
            self.nbytes += (key.len() + value.len()) as u64;
            self.order.push_front(key.to_string());
            self.entries.insert(key.to_string(), value);
        }

        while self.max_bytes > 0 && self.nbytes > self.max_bytes {
            self.remove_oldest();
        }
    }

    /// Looks up a key, promoting it to most-recently-used on a hit.
    pub fn get(&mut self, key: &str) -> Option<ByteView> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.promote(key);
        self.entries.get(key).cloned()
    }

    /// Evicts the least-recently-used entry, if any.
    pub fn remove_oldest(&mut self) {
        let Some(key) = self.order.pop_back() else {
            return;
        };
        if let Some(value) = self.entries.remove(&key) {
            self.nbytes -= (key.len() + value.len()) as u64;
            debug!(%key, "evicted least-recently-used entry");
            if let Some(on_evicted) = self.on_evicted.as_mut() {
                on_evicted(&key, &value);
            }
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current byte usage, including key lengths.
    pub fn nbytes(&self) -> u64 {
        self.nbytes
    }

    fn promote(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push_front(key.to_string());
    }
}
