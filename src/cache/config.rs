//! Cache configuration.

use std::time::Duration;

const DEFAULT_TTL_SECONDS: u64 = 300;

#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// How long a loaded collection snapshot is served before reloading.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            ttl: Duration::from_secs(settings.ttl_seconds.get()),
        }
    }
}
