//! In-memory TTL cache with oldest-first eviction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use eventlens_core::EnhancedPhrase;
use parking_lot::Mutex;
use tracing::debug;

use crate::KeyphraseCache;

struct CacheEntry {
    result: Vec<EnhancedPhrase>,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    /// Valid while `now <= created_at + ttl`.
    fn is_valid(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) <= self.ttl
    }
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Insertion order, oldest first.
    order: Vec<String>,
    max_entries: usize,
}

/// Thread-safe keyphrase cache. Expired entries are purged lazily on lookup.
pub struct InMemoryKeyphraseCache {
    inner: Mutex<CacheInner>,
}

impl InMemoryKeyphraseCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_entries.min(1024)),
                order: Vec::new(),
                max_entries: max_entries.max(1),
            }),
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

impl Default for InMemoryKeyphraseCache {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl KeyphraseCache for InMemoryKeyphraseCache {
    fn get(&self, key: &str) -> Option<Vec<EnhancedPhrase>> {
        let mut inner = self.inner.lock();

        let valid = inner.entries.get(key).map(|e| e.is_valid(Instant::now()))?;
        if valid {
            return inner.entries.get(key).map(|e| e.result.clone());
        }

        debug!("Evicting expired cache entry {}", key);
        inner.entries.remove(key);
        inner.order.retain(|k| k != key);
        None
    }

    fn put(&self, key: String, value: Vec<EnhancedPhrase>, ttl: Duration) {
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        } else {
            while inner.entries.len() >= inner.max_entries && !inner.order.is_empty() {
                let oldest = inner.order.remove(0);
                inner.entries.remove(&oldest);
            }
        }

        inner.order.push(key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                result: value,
                created_at: Instant::now(),
                ttl,
            },
        );
    }

    fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}
