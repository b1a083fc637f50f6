//! Bounded read-through cache with per-entry expiry.
//!
//! An explicit map plus a loader per call: on miss or expiry the loader is
//! invoked and its value stored. Entries are never invalidated on write —
//! staleness up to the TTL is accepted.
//!
//! ## Example
//!
//! ```ignore
//! let cache: TtlCache<Uuid, Product> = TtlCache::new(256, Duration::from_secs(30));
//! let product = cache.get_or_load(id, || store.product(id))?;
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Fixed-capacity, time-expiring cache. Clones share the same entries.
#[derive(Clone)]
pub struct TtlCache<K, V> {
    entries: Arc<RwLock<HashMap<K, Entry<V>>>>,
    capacity: usize,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Return the cached value if present and not expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().ok()?;
        entries
            .get(key)
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| e.value.clone())
    }

    /// Read-through: return the cached value, or invoke the loader and
    /// cache whatever it produces. A `None` from the loader is not cached.
    ///
    /// On a poisoned lock the cache steps aside and the loader's result is
    /// returned directly.
    pub fn get_or_load<E, F>(&self, key: K, loader: F) -> Result<Option<V>, E>
    where
        F: FnOnce() -> Result<Option<V>, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(Some(value));
        }

        let loaded = loader()?;
        if let Some(value) = &loaded {
            self.store(key, value.clone());
        }
        Ok(loaded)
    }

    fn store(&self, key: K, value: V) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };

        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            let ttl = self.ttl;
            entries.retain(|_, e| e.stored_at.elapsed() < ttl);

            // still full: drop the oldest entry
            if entries.len() >= self.capacity {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.stored_at)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
