//! Database Connection Pool Module
//!
//! This module provides PostgreSQL connection pooling using
//! deadpool-postgres and the aggregation query that computes per-user
//! statistics for a campaign hashtag in a single round trip.

use crate::error::{ApiError, ApiResult};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use std::time::Duration;
use tagstats_core::{RawUserAggregates, Timestamp, UserStats};
use tokio_postgres::{NoTls, Row};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "tagstats".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("TAGSTATS_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TAGSTATS_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("TAGSTATS_DB_NAME").unwrap_or_else(|_| "tagstats".to_string()),
            user: std::env::var("TAGSTATS_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("TAGSTATS_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("TAGSTATS_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("TAGSTATS_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// AGGREGATION QUERY
// ============================================================================

/// Per-user statistics for one hashtag, computed in a single statement.
///
/// The subquery selects the change-sets associated with the hashtag
/// (exact, case-sensitive match); the outer query joins them to their
/// owning users and aggregates per (name, user_id) group. Waterway and
/// POI edits contribute only their "add" counts to the edit total. Sums
/// over non-uniform columns are cast so that row decoding is
/// deterministic; the normalization rules live in tagstats-core. No row
/// order is guaranteed.
const USER_STATS_QUERY: &str = "
SELECT changesets.user_id::bigint AS user_id,
       users.name,
       COUNT(*) AS changesets,
       SUM(road_km_mod + road_km_add)::float8 AS roads,
       SUM(building_count_add + building_count_mod)::float8 AS buildings,
       SUM(building_count_add + building_count_mod +
           road_count_add + road_count_mod +
           waterway_count_add + poi_count_add)::bigint AS edits,
       MAX(changesets.created_at)::timestamptz AS created_at
FROM changesets
JOIN users ON changesets.user_id = users.id
WHERE changesets.id IN (
    SELECT changeset_id
    FROM changesets_hashtags
    JOIN hashtags ON hashtags.id = changesets_hashtags.hashtag_id
    WHERE hashtags.hashtag = $1
)
GROUP BY users.name, changesets.user_id
";

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Database client that wraps a connection pool and provides the
/// high-level read operations used by the routes.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        let status = self.pool.status();
        status.size
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Compute per-user statistics for `hashtag`.
    ///
    /// One round trip; an unknown hashtag yields an empty vector, not an
    /// error. Raw aggregates are normalized at this boundary, before the
    /// result reaches the cache.
    pub async fn user_stats(&self, hashtag: &str) -> ApiResult<Vec<UserStats>> {
        let conn = self.get_conn().await?;

        let rows = conn.query(USER_STATS_QUERY, &[&hashtag]).await?;

        rows.iter().map(row_to_user_stats).collect()
    }

    /// List every known campaign hashtag value.
    pub async fn hashtag_list(&self) -> ApiResult<Vec<String>> {
        let conn = self.get_conn().await?;

        let rows = conn.query("SELECT hashtag FROM hashtags", &[]).await?;

        Ok(rows.iter().map(|row| row.get("hashtag")).collect())
    }

    /// Validate pool connectivity for the readiness probe.
    pub async fn health_check(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }
}

/// Coerce one aggregate row into a normalized statistics record.
fn row_to_user_stats(row: &Row) -> ApiResult<UserStats> {
    let raw = RawUserAggregates {
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        changesets: row.try_get("changesets")?,
        edits: row.try_get::<_, Option<i64>>("edits")?.unwrap_or(0),
        roads: row.try_get::<_, Option<f64>>("roads")?.unwrap_or(0.0),
        buildings: row.try_get::<_, Option<f64>>("buildings")?.unwrap_or(0.0),
        created_at: row.try_get::<_, Timestamp>("created_at")?,
    };

    Ok(UserStats::from_aggregates(raw))
}
