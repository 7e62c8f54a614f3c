//! Shared application state for Axum routers.

use crate::cached_stats::CachedStatsClient;
use crate::config::ApiConfig;
use crate::db::DbClient;
use crate::snapshot::SnapshotStore;
use crate::trend::TrendClient;

/// Application-wide state shared across all routes.
///
/// Constructed once at startup; the statistics cache inside
/// `stats` is the only shared mutable state in the process.
#[derive(Clone)]
pub struct AppState {
    /// Raw database client (for operations that don't need caching).
    pub db: DbClient,
    /// Cached statistics client. Routes should prefer this for the
    /// per-hashtag statistics read; the cache is transparent.
    pub stats: CachedStatsClient,
    /// Map snapshot store.
    pub snapshots: SnapshotStore,
    /// Trend distribution client.
    pub trends: TrendClient,
    /// External collaborator configuration.
    pub config: ApiConfig,
    pub start_time: std::time::Instant,
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(DbClient, db);
crate::impl_from_ref!(CachedStatsClient, stats);
crate::impl_from_ref!(SnapshotStore, snapshots);
crate::impl_from_ref!(TrendClient, trends);
crate::impl_from_ref!(ApiConfig, config);
crate::impl_from_ref!(std::time::Instant, start_time);
