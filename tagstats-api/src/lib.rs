//! tagstats API - Campaign Hashtag Statistics Service
//!
//! This crate exposes the HTTP surface over the statistics core: a
//! single-flight cached aggregation of per-user edit statistics, a
//! precomputed map-snapshot store, and a trending-hashtags upstream.
//!
//! The cache + aggregation composition lives in [`cached_stats`]; the
//! route handlers are thin wrappers that translate outcomes into HTTP
//! responses.

pub mod cached_stats;
pub mod config;
pub mod db;
pub mod error;
pub mod macros;
pub mod openapi;
pub mod routes;
pub mod snapshot;
pub mod state;
pub mod telemetry;
pub mod trend;

// Re-export commonly used types
pub use cached_stats::{CachedStatsClient, StatsCache};
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use openapi::ApiDoc;
pub use snapshot::SnapshotStore;
pub use state::AppState;
pub use telemetry::TelemetryConfig;
pub use trend::TrendClient;
