//! Cache configuration.
//!
//! Controls the page cache via `foglio.toml`.

use std::num::NonZeroUsize;

use serde::Deserialize;
use time::Duration;

// Default values for cache configuration
const DEFAULT_TTL_SECONDS: u64 = 20;
const DEFAULT_MAX_PAGES: usize = 64;

/// Cache configuration from `foglio.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the global feed page cache.
    pub enabled: bool,
    /// Seconds a cached page stays servable.
    pub ttl_seconds: u64,
    /// Maximum cached pages before LRU eviction.
    pub max_pages: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl_seconds: settings.ttl_seconds.get(),
            max_pages: settings.max_pages.get(),
        }
    }
}

impl CacheConfig {
    /// TTL as a [`Duration`], saturating on absurdly large settings.
    pub fn ttl(&self) -> Duration {
        Duration::seconds(i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX))
    }

    /// Returns the page limit as NonZeroUsize, clamping to 1 if zero.
    pub fn max_pages_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_pages).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl_seconds, 20);
        assert_eq!(config.max_pages, 64);
    }

    #[test]
    fn ttl_converts_to_duration() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl(), Duration::seconds(20));
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            max_pages: 0,
            ..Default::default()
        };
        assert_eq!(config.max_pages_non_zero().get(), 1);
    }
}
