// Bounded least-recently-used cache, safe to share between threads.
//
// Entries live in a hash map keyed by the caller's key; a second, ordered
// index maps a monotonically increasing access stamp to the key that was
// touched at that stamp. The smallest stamp is always the least recently
// used entry, so eviction is a `pop_first` on the ordered index instead of
// a scan. Every `get` hit and every `insert` moves the key to a fresh stamp.
//
// Recency comes from the internal stamp counter, never from wall-clock time
// or map iteration order, so eviction order is a pure function of the
// sequence of calls.
//
// All state sits behind one `Mutex`. A poisoned lock is recovered rather
// than propagated: the cache holds only values the caller can recompute, so
// a panic mid-update cannot leave anything the caller depends on.
//
// Used by `codex_lattice_gen` to memoize generated records by index.

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use std::collections::BTreeMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Snapshot of cache occupancy and counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Fixed-capacity LRU cache.
///
/// A capacity of zero is allowed and stores nothing: every `get` misses and
/// every `insert` is dropped.
pub struct LruCache<K, V> {
    capacity: usize,
    inner: Mutex<Inner<K, V>>,
}

struct Slot<V> {
    value: V,
    stamp: u64,
}

struct Inner<K, V> {
    entries: HashMap<K, Slot<V>, FxBuildHasher>,
    // Access stamp -> key. Stamps are unique, so one key per stamp.
    recency: BTreeMap<u64, K>,
    clock: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K: Eq + Hash + Clone, V: Clone> Inner<K, V> {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn touch(&mut self, key: &K) -> Option<V> {
        let stamp = self.tick();
        match self.entries.get_mut(key) {
            Some(slot) => {
                self.recency.remove(&slot.stamp);
                slot.stamp = stamp;
                self.recency.insert(stamp, key.clone());
                self.hits += 1;
                Some(slot.value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    fn insert(&mut self, capacity: usize, key: K, value: V) -> Option<(K, V)> {
        if capacity == 0 {
            return None;
        }
        let stamp = self.tick();
        if let Some(slot) = self.entries.get_mut(&key) {
            self.recency.remove(&slot.stamp);
            slot.stamp = stamp;
            slot.value = value;
            self.recency.insert(stamp, key);
            return None;
        }
        let evicted = if self.entries.len() >= capacity {
            self.evict_oldest()
        } else {
            None
        };
        self.recency.insert(stamp, key.clone());
        self.entries.insert(key, Slot { value, stamp });
        evicted
    }

    fn evict_oldest(&mut self) -> Option<(K, V)> {
        let (_, key) = self.recency.pop_first()?;
        let slot = self.entries.remove(&key)?;
        self.evictions += 1;
        trace!(evictions = self.evictions, "evicted least recently used entry");
        Some((key, slot.value))
    }
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: HashMap::with_hasher(FxBuildHasher),
                recency: BTreeMap::new(),
                clock: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a key, marking it most recently used on a hit.
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().touch(key)
    }

    /// Presence check that does not affect recency or counters.
    pub fn contains(&self, key: &K) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Insert or replace a value. Returns the entry evicted to make room,
    /// if any. Replacing an existing key never evicts.
    pub fn insert(&self, key: K, value: V) -> Option<(K, V)> {
        let capacity = self.capacity;
        self.lock().insert(capacity, key, value)
    }

    /// Return the cached value for `key`, computing and inserting it on a
    /// miss.
    ///
    /// `make` runs without the lock held, so two threads missing on the same
    /// key may both compute it; the later insert wins. Callers must only use
    /// this for values that are a pure function of the key.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&self, key: K, make: F) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = make();
        self.insert(key, value.clone());
        value
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();
        let slot = inner.entries.remove(key)?;
        inner.recency.remove(&slot.stamp);
        Some(slot.value)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.recency.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            len: inner.entries.len(),
            capacity: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
