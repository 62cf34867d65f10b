//! Cache configuration.

use std::num::NonZeroUsize;

const DEFAULT_CAPACITY: usize = 1024;

/// Worker cache configuration, usually built from the `[cache]` settings table.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Consult and fill the cache on reads. When off, every read goes to the
    /// durable store.
    pub enabled: bool,
    /// Maximum cached lookups (positive and negative) before LRU eviction.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
