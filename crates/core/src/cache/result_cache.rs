use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use crate::schema::BoundArguments;

/// Identity of one invocation: md5 of the dotted name and the canonical arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(module: &str, args: &BoundArguments) -> Self {
        let material = format!("{module}\0{}", args.canonical_json());
        Self(format!("{:x}", md5::compute(material.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// TTL + LRU bounded result cache with single-flight misses.
///
/// Concurrent misses on one key serialize on a per-key lock: the first caller
/// computes, later callers find the stored value. Failed computations are
/// never stored.
pub struct ResultCache<V> {
    entries: Mutex<LruCache<CacheKey, CacheEntry<V>>>,
    in_flight: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
    ttl: Duration,
}

impl<V> fmt::Debug for ResultCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("len", &self.entries.lock().len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<V: Clone> ResultCache<V> {
    pub fn new(ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stored value for `key` unless it has expired
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }
        trace!(key = %key, "dropping expired entry");
        entries.pop(key);
        None
    }

    /// Store `value` with a fresh expiry, replacing any previous entry
    pub fn insert(&self, key: CacheKey, value: V) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        let mut entries = self.entries.lock();
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                trace!(key = %evicted, "evicted least recently used entry");
            }
        }
    }

    /// Return the live entry for `key`, or compute, store and return a new one.
    ///
    /// With `bypass` the stored entry is ignored and overwritten.
    pub fn get_or_compute<E, F>(&self, key: &CacheKey, bypass: bool, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if !bypass {
            if let Some(value) = self.get(key) {
                trace!(key = %key, "cache hit");
                return Ok(value);
            }
        }

        let slot = self.acquire_slot(key);
        let result = {
            let _guard = slot.lock();
            match (!bypass).then(|| self.get(key)).flatten() {
                Some(value) => {
                    trace!(key = %key, "computed by a concurrent caller");
                    Ok(value)
                }
                None => {
                    trace!(key = %key, bypass, "computing");
                    compute().inspect(|value| self.insert(key.clone(), value.clone()))
                }
            }
        };
        self.release_slot(key, slot);
        result
    }

    pub fn invalidate(&self, key: &CacheKey) -> Option<V> {
        self.entries.lock().pop(key).map(|entry| entry.value)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn acquire_slot(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock();
        Arc::clone(in_flight.entry(key.clone()).or_default())
    }

    fn release_slot(&self, key: &CacheKey, slot: Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock();
        // One reference in the map, one held here: nobody else is waiting.
        let idle = in_flight
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, &slot) && Arc::strong_count(&slot) <= 2);
        drop(slot);
        if idle {
            in_flight.remove(key);
        }
    }
}
