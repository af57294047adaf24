//! Cache configuration.

use std::time::Duration;

/// Sizing and expiry of a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entries beyond this are evicted, least recently used first.
    pub max_capacity: u64,

    /// Entries older than this are dropped. `None` keeps them until evicted
    /// or invalidated.
    pub ttl: Option<Duration>,
}

impl CacheConfig {
    /// Config for the recent poster set.
    ///
    /// The window is cleared explicitly by maintenance, so there is no TTL;
    /// the capacity bound keeps memory flat during a raid.
    pub fn poster_window() -> Self {
        Self {
            max_capacity: 50_000,
            ttl: None,
        }
    }
}
