//! API Configuration Module
//!
//! Configuration for the external collaborators (snapshot store, trend
//! service) and the statistics cache. Loaded from environment variables
//! with defaults that match the docker-compose service names used in
//! development.

use std::time::Duration;

use tagstats_cache::DEFAULT_TTL;

/// Default trend service base URL.
pub const DEFAULT_FORGETTABLE_URL: &str = "http://forgettable:8080";

/// Default snapshot store URL.
pub const DEFAULT_REDIS_URL: &str = "redis://redis/";

/// Default number of trending hashtags to request.
pub const DEFAULT_TREND_COUNT: u32 = 5;

/// API configuration for external collaborators and caching.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Trend service base URL.
    pub forgettable_url: String,

    /// Snapshot store connection URL.
    pub redis_url: String,

    /// Freshness window for cached statistics.
    pub cache_ttl: Duration,

    /// How many trending hashtags to request from the trend service.
    pub trend_count: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            forgettable_url: DEFAULT_FORGETTABLE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            cache_ttl: DEFAULT_TTL,
            trend_count: DEFAULT_TREND_COUNT,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `TAGSTATS_FORGETTABLE_URL`: trend service base URL
    /// - `TAGSTATS_REDIS_URL`: snapshot store URL
    /// - `TAGSTATS_CACHE_TTL_MS`: statistics cache TTL in milliseconds (default: 20000)
    /// - `TAGSTATS_TREND_COUNT`: trending hashtags to request (default: 5)
    pub fn from_env() -> Self {
        let forgettable_url = std::env::var("TAGSTATS_FORGETTABLE_URL")
            .unwrap_or_else(|_| DEFAULT_FORGETTABLE_URL.to_string());

        let redis_url =
            std::env::var("TAGSTATS_REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());

        let cache_ttl = std::env::var("TAGSTATS_CACHE_TTL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TTL);

        let trend_count = std::env::var("TAGSTATS_TREND_COUNT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TREND_COUNT);

        Self {
            forgettable_url,
            redis_url,
            cache_ttl,
            trend_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.forgettable_url, "http://forgettable:8080");
        assert_eq!(config.redis_url, "redis://redis/");
        assert_eq!(config.cache_ttl, Duration::from_millis(20_000));
        assert_eq!(config.trend_count, 5);
    }
}
