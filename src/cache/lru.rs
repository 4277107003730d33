//! Byte-bounded LRU store for full HTTP responses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;

use crate::config::CacheConfig;
use crate::observability::metrics;

/// A cached response and its links in the recency list.
///
/// The key is shared between the entry and the index so the bytes are stored
/// once. Links are slot indices into the arena, head = most recently used.
struct Entry {
    key: Arc<[u8]>,
    value: Bytes,
    prev: Option<usize>,
    next: Option<usize>,
}

impl Entry {
    fn cost(&self) -> usize {
        self.key.len() + self.value.len()
    }
}

#[derive(Default)]
struct LruState {
    slots: Vec<Option<Entry>>,
    free: Vec<usize>,
    index: HashMap<Arc<[u8]>, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    used_bytes: usize,
}

impl LruState {
    fn entry(&self, idx: usize) -> &Entry {
        self.slots[idx].as_ref().expect("linked slot is occupied")
    }

    fn entry_mut(&mut self, idx: usize) -> &mut Entry {
        self.slots[idx].as_mut().expect("linked slot is occupied")
    }

    /// Detach a slot from the recency list without freeing it.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let entry = self.entry(idx);
            (entry.prev, entry.next)
        };

        match prev {
            Some(p) => self.entry_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.entry_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }

    /// Link a detached slot at the front of the recency list.
    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let entry = self.entry_mut(idx);
            entry.prev = None;
            entry.next = old_head;
        }
        if let Some(h) = old_head {
            self.entry_mut(h).prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    /// Remove a slot entirely: recency list, index, size accounting.
    fn remove(&mut self, idx: usize) -> usize {
        self.unlink(idx);
        let entry = self.slots[idx].take().expect("linked slot is occupied");
        self.index.remove(&entry.key);
        self.free.push(idx);
        self.used_bytes -= entry.cost();
        entry.cost()
    }

    /// Evict the least recently used entry. Returns false on an empty list.
    fn evict_tail(&mut self) -> bool {
        match self.tail {
            Some(idx) => {
                self.remove(idx);
                true
            }
            None => false,
        }
    }

    fn insert_front(&mut self, key: Arc<[u8]>, value: Bytes) {
        let entry = Entry {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        };
        let cost = entry.cost();

        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };

        self.push_front(idx);
        self.index.insert(key, idx);
        self.used_bytes += cost;
    }
}

/// Thread-safe LRU cache mapping raw request bytes to full response bytes,
/// bounded by total byte capacity.
///
/// A `get` promotes the entry to the front of the recency list; `put` evicts
/// from the tail until the new entry fits. Entries larger than the per-entry
/// cap or the total capacity are never stored.
pub struct ResponseCache {
    inner: Mutex<LruState>,
    capacity_bytes: usize,
    max_entry_bytes: usize,
}

impl ResponseCache {
    pub fn new(capacity_bytes: usize, max_entry_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(LruState::default()),
            capacity_bytes,
            max_entry_bytes,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity_bytes, config.max_entry_bytes)
    }

    /// Look up a response by raw request bytes.
    ///
    /// On a hit the entry becomes the most recently used. Returns a cheap
    /// refcounted clone of the stored bytes. A miss performs no allocation.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        let mut state = self.lock();

        let idx = match state.index.get(key) {
            Some(&idx) => idx,
            None => return None,
        };

        state.unlink(idx);
        state.push_front(idx);
        Some(state.entry(idx).value.clone())
    }

    /// Insert a response under the raw request bytes that produced it.
    ///
    /// An existing entry under the same key is replaced. Tail entries are
    /// evicted until the new entry fits. An entry whose key + value exceeds
    /// the per-entry cap or the total capacity is dropped without mutation.
    pub fn put(&self, key: &[u8], value: Bytes) {
        let entry_bytes = key.len() + value.len();
        if entry_bytes > self.max_entry_bytes || entry_bytes > self.capacity_bytes {
            tracing::debug!(
                entry_bytes,
                max_entry_bytes = self.max_entry_bytes,
                capacity_bytes = self.capacity_bytes,
                "Entry too large, not cached"
            );
            return;
        }

        let mut state = self.lock();

        let existing = state.index.get(key).copied();
        if let Some(idx) = existing {
            state.remove(idx);
        }

        let mut evicted = 0u64;
        while state.used_bytes + entry_bytes > self.capacity_bytes {
            if !state.evict_tail() {
                break;
            }
            evicted += 1;
        }

        state.insert_front(Arc::from(key), value);

        let used = state.used_bytes;
        drop(state);

        if evicted > 0 {
            metrics::record_cache_evictions(evicted);
        }
        metrics::record_cache_store(entry_bytes);
        metrics::record_cache_size(used);
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes currently stored (keys + values).
    pub fn used_bytes(&self) -> usize {
        self.lock().used_bytes
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of(len: usize) -> Bytes {
        Bytes::from(vec![b'x'; len])
    }

    #[test]
    fn test_miss_on_empty() {
        let cache = ResponseCache::new(100, 100);
        assert!(cache.get(b"a").is_none());
        assert_eq!(cache.used_bytes(), 0);
    }

    #[test]
    fn test_hit_returns_stored_value() {
        let cache = ResponseCache::new(100, 100);
        cache.put(b"key", Bytes::from_static(b"response"));

        assert_eq!(cache.get(b"key").unwrap(), Bytes::from_static(b"response"));
        assert_eq!(cache.used_bytes(), 3 + 8);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_repeated_get_is_stable() {
        let cache = ResponseCache::new(100, 100);
        cache.put(b"k", value_of(10));

        let first = cache.get(b"k").unwrap();
        let second = cache.get(b"k").unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.used_bytes(), 11);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overwrite_replaces_value_and_size() {
        let cache = ResponseCache::new(100, 100);
        cache.put(b"k", value_of(10));
        cache.put(b"k", value_of(40));

        assert_eq!(cache.get(b"k").unwrap().len(), 40);
        assert_eq!(cache.used_bytes(), 41);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_oversized_entry_leaves_cache_unchanged() {
        let cache = ResponseCache::new(100, 100);
        cache.put(b"a", value_of(50));
        let before = cache.used_bytes();

        cache.put(b"big", value_of(200));

        assert_eq!(cache.used_bytes(), before);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(b"a").unwrap().len(), 50);
        assert!(cache.get(b"big").is_none());
    }

    #[test]
    fn test_per_entry_cap_applies_below_capacity() {
        let cache = ResponseCache::new(1000, 100);
        cache.put(b"k", value_of(150));

        assert!(cache.get(b"k").is_none());
        assert_eq!(cache.used_bytes(), 0);
    }

    #[test]
    fn test_exact_capacity_boundary() {
        let cache = ResponseCache::new(100, 100);

        // key (3) + value (97) == capacity: cacheable
        cache.put(b"key", value_of(97));
        assert!(cache.get(b"key").is_some());

        // one byte larger: rejected without touching the cache
        let cache = ResponseCache::new(100, 100);
        cache.put(b"key", value_of(98));
        assert!(cache.get(b"key").is_none());
        assert_eq!(cache.used_bytes(), 0);
    }

    #[test]
    fn test_eviction_drops_oldest() {
        // Capacity 100: A (60) then B (60) leaves only B.
        let cache = ResponseCache::new(100, 100);
        cache.put(b"A", value_of(59));
        cache.put(b"B", value_of(59));

        assert!(cache.get(b"A").is_none());
        assert_eq!(cache.get(b"B").unwrap().len(), 59);
        assert_eq!(cache.used_bytes(), 60);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_refreshes_recency() {
        // Three 30-byte entries fill 90 of 100 bytes. Touching the oldest
        // makes the middle one the eviction victim.
        let cache = ResponseCache::new(100, 100);
        cache.put(b"a", value_of(29));
        cache.put(b"b", value_of(29));
        cache.put(b"c", value_of(29));

        assert!(cache.get(b"a").is_some());
        cache.put(b"d", value_of(29));

        assert!(cache.get(b"b").is_none());
        assert!(cache.get(b"a").is_some());
        assert!(cache.get(b"c").is_some());
        assert!(cache.get(b"d").is_some());
        assert_eq!(cache.used_bytes(), 90);
    }

    #[test]
    fn test_eviction_cascades_until_fit() {
        let cache = ResponseCache::new(100, 100);
        cache.put(b"a", value_of(29));
        cache.put(b"b", value_of(29));
        cache.put(b"c", value_of(29));

        cache.put(b"e", value_of(89));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(b"e").unwrap().len(), 89);
        assert_eq!(cache.used_bytes(), 90);
    }

    #[test]
    fn test_empty_value_is_storable() {
        let cache = ResponseCache::new(100, 100);
        cache.put(b"k", Bytes::new());

        assert_eq!(cache.get(b"k").unwrap().len(), 0);
        assert_eq!(cache.used_bytes(), 1);
    }

    #[test]
    fn test_slot_reuse_after_eviction() {
        let cache = ResponseCache::new(60, 60);
        for round in 0u8..10 {
            let key = [b'k', round];
            cache.put(&key, value_of(48));
            assert_eq!(cache.len(), 1, "each insert evicts the previous");
            assert_eq!(cache.used_bytes(), 50);
        }
    }

    #[test]
    fn test_concurrent_access_keeps_accounting() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(ResponseCache::new(10_000, 10_000));
        let mut handles = Vec::new();
        for t in 0u8..4 {
            let cache = cache.clone();
            handles.push(thread::spawn(move || {
                for i in 0u8..100 {
                    let key = [t, i];
                    cache.put(&key, value_of(64));
                    cache.get(&key);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert!(cache.used_bytes() <= cache.capacity_bytes());
        assert_eq!(cache.used_bytes(), cache.len() * (2 + 64));
    }
}
