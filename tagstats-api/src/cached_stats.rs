//! Cached Statistics Client
//!
//! This module provides the `CachedStatsClient` wrapper that puts the
//! single-flight cache in front of the aggregation query. Routes call
//! `user_stats()` unchanged and the cache is used transparently: a burst
//! of requests for a popular hashtag triggers one query, and the result
//! is replayed to every concurrent caller and reused until it goes
//! stale.

use std::sync::Arc;

use tagstats_cache::SingleFlightCache;
use tagstats_core::UserStats;

use crate::db::DbClient;
use crate::error::{ApiError, ApiResult};

/// Cache type used for per-hashtag statistics.
///
/// The key is the hashtag exactly as supplied by the caller: the cache
/// performs no case normalization (unlike the map-snapshot lookup, which
/// lowercases its key).
pub type StatsCache = SingleFlightCache<String, Vec<UserStats>, ApiError>;

/// Statistics client with a transparent single-flight cache.
///
/// Owned by the composition root and shared by reference; there is no
/// process-global cache state.
#[derive(Clone)]
pub struct CachedStatsClient {
    /// The underlying database client.
    db: DbClient,
    /// The single-flight cache.
    cache: Arc<StatsCache>,
}

impl CachedStatsClient {
    /// Create a new cached statistics client.
    pub fn new(db: DbClient, cache: Arc<StatsCache>) -> Self {
        Self { db, cache }
    }

    /// Get a reference to the underlying database client.
    pub fn db(&self) -> &DbClient {
        &self.db
    }

    /// Get a reference to the cache.
    pub fn cache(&self) -> &StatsCache {
        &self.cache
    }

    /// Per-user statistics for `hashtag`, served from the cache when
    /// fresh.
    ///
    /// Concurrent calls for the same hashtag share one aggregation
    /// query; a failed refresh is fanned out to every waiter and leaves
    /// any previously stored value untouched.
    pub async fn user_stats(&self, hashtag: &str) -> ApiResult<Vec<UserStats>> {
        let db = self.db.clone();
        self.cache
            .get(hashtag.to_string(), move |tag| async move {
                db.user_stats(&tag).await
            })
            .await
            .map_err(ApiError::from)
    }
}
