//! Response cache configuration.
//!
//! Controlled through the `[cache]` table of `storefront.toml`; per-resource
//! TTLs are keyed by cache prefix under `[cache.ttl_seconds]`.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_CAPACITY: usize = 1024;
const DEFAULT_TTL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Serve and store collection responses through the cache.
    pub enabled: bool,
    /// Maximum number of cached responses before LRU eviction.
    pub capacity: usize,
    /// TTL applied to resources without an override.
    pub default_ttl_secs: u64,
    /// Per-prefix TTL overrides.
    pub ttl_overrides: BTreeMap<String, u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            default_ttl_secs: DEFAULT_TTL_SECS,
            ttl_overrides: BTreeMap::new(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity.get(),
            default_ttl_secs: settings.default_ttl.as_secs(),
            ttl_overrides: settings
                .ttl_overrides
                .iter()
                .map(|(prefix, ttl)| (prefix.clone(), ttl.as_secs()))
                .collect(),
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn ttl_for(&self, cache_prefix: &str) -> Duration {
        let secs = self
            .ttl_overrides
            .get(cache_prefix)
            .copied()
            .unwrap_or(self.default_ttl_secs);
        Duration::from_secs(secs)
    }

    pub fn with_ttl(mut self, cache_prefix: &str, secs: u64) -> Self {
        self.ttl_overrides.insert(cache_prefix.to_string(), secs);
        self
    }
}
