//! Response store implementations.
//!
//! Entries are serialized collection bodies. Each carries its own expiry and
//! is replaced wholesale on `set`; nothing is invalidated on writes.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Key-value store for rendered collection responses.
pub trait ResponseStore: Send + Sync {
    /// Returns the cached body when present and unexpired.
    fn get(&self, key: &str) -> Option<Bytes>;

    /// Stores `body` under `key` for `ttl`, replacing any previous entry.
    fn set(&self, key: String, body: Bytes, ttl: Duration);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct Entry {
    body: Bytes,
    expires_at: Instant,
}

/// Bounded in-process store with per-entry TTL and LRU eviction.
pub struct MemoryResponseStore {
    entries: RwLock<LruCache<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryResponseStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
            clock,
        }
    }
}

impl ResponseStore for MemoryResponseStore {
    fn get(&self, key: &str) -> Option<Bytes> {
        let now = self.clock.now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.body.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
            debug!(target: "storefront::cache", key, "expired entry dropped");
        }
        None
    }

    fn set(&self, key: String, body: Bytes, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        let evicted = rw_write(&self.entries, SOURCE, "set").push(key, Entry { body, expires_at });
        if let Some((evicted_key, _)) = evicted {
            debug!(target: "storefront::cache", key = %evicted_key, "entry evicted");
        }
    }

    fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }
}

/// Store used when caching is disabled: every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResponseStore;

impl ResponseStore for NoopResponseStore {
    fn get(&self, _key: &str) -> Option<Bytes> {
        None
    }

    fn set(&self, _key: String, _body: Bytes, _ttl: Duration) {}

    fn len(&self) -> usize {
        0
    }
}

/// Build the store described by `config`.
pub fn build_store(config: &CacheConfig) -> Arc<dyn ResponseStore> {
    if config.enabled {
        Arc::new(MemoryResponseStore::new(config))
    } else {
        Arc::new(NoopResponseStore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;

    fn store_with_clock(capacity: usize) -> (MemoryResponseStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig {
            capacity,
            ..Default::default()
        };
        (MemoryResponseStore::with_clock(&config, clock.clone()), clock)
    }

    #[test]
    fn entry_is_served_until_ttl_elapses() {
        let (store, clock) = store_with_clock(8);
        store.set("k".into(), Bytes::from_static(b"body"), Duration::from_secs(60));

        clock.advance(Duration::from_secs(59));
        assert_eq!(store.get("k"), Some(Bytes::from_static(b"body")));

        clock.advance(Duration::from_secs(1));
        assert_eq!(store.get("k"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn set_replaces_existing_entry_and_ttl() {
        let (store, clock) = store_with_clock(8);
        store.set("k".into(), Bytes::from_static(b"old"), Duration::from_secs(10));
        clock.advance(Duration::from_secs(5));
        store.set("k".into(), Bytes::from_static(b"new"), Duration::from_secs(10));
        clock.advance(Duration::from_secs(8));
        assert_eq!(store.get("k"), Some(Bytes::from_static(b"new")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let (store, _clock) = store_with_clock(2);
        let ttl = Duration::from_secs(60);
        store.set("a".into(), Bytes::from_static(b"a"), ttl);
        store.set("b".into(), Bytes::from_static(b"b"), ttl);
        assert!(store.get("a").is_some());
        store.set("c".into(), Bytes::from_static(b"c"), ttl);

        assert!(store.get("a").is_some());
        assert!(store.get("b").is_none());
        assert!(store.get("c").is_some());
    }

    #[test]
    fn disabled_config_builds_noop_store() {
        let config = CacheConfig {
            enabled: false,
            ..Default::default()
        };
        let store = build_store(&config);
        store.set("k".into(), Bytes::from_static(b"x"), Duration::from_secs(60));
        assert!(store.get("k").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_writers_leave_one_entry() {
        let (store, _clock) = store_with_clock(8);
        let store = Arc::new(store);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.set(
                        "shared".into(),
                        Bytes::from(format!("v{i}")),
                        Duration::from_secs(60),
                    );
                    store.get("shared")
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().expect("thread").is_some());
        }
        assert_eq!(store.len(), 1);
    }
}
