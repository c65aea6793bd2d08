//! Validator configuration.

use std::time::Duration;

use crate::cache::DEFAULT_CACHE_TTL;

/// Configuration for a [`Validator`](crate::Validator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Maximum age of a cached catalog before it is rebuilt.
    pub cache_ttl: Duration,
}

impl ValidatorConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Set the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the cache TTL in milliseconds.
    pub fn with_cache_ttl_ms(self, ttl_ms: u64) -> Self {
        self.with_cache_ttl(Duration::from_millis(ttl_ms))
    }

    /// The cache TTL in milliseconds, saturating at `u64::MAX`.
    pub fn cache_ttl_ms(&self) -> u64 {
        u64::try_from(self.cache_ttl.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::new()
    }
}
