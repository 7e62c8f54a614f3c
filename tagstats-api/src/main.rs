//! tagstats API Server Entry Point
//!
//! Bootstraps telemetry and configuration, connects the external
//! collaborators, builds the single statistics cache instance, and
//! starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use tagstats_api::routes::create_api_router;
use tagstats_api::telemetry::{init_telemetry, TelemetryConfig};
use tagstats_api::{
    ApiConfig, ApiError, ApiResult, AppState, CachedStatsClient, DbClient, DbConfig,
    SnapshotStore, StatsCache, TrendClient,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_telemetry(&telemetry_config);

    let api_config = ApiConfig::from_env();
    let db_config = DbConfig::from_env();
    let db = DbClient::from_config(&db_config)?;

    let snapshots = SnapshotStore::connect(&api_config.redis_url).await?;
    let trends = TrendClient::new(api_config.forgettable_url.clone());

    // The one statistics cache instance for this process, shared by
    // reference through the application state.
    let cache = Arc::new(StatsCache::new(api_config.cache_ttl));
    let stats = CachedStatsClient::new(db.clone(), cache);

    let state = AppState {
        db,
        stats,
        snapshots,
        trends,
        config: api_config,
        start_time: std::time::Instant::now(),
    };
    let app = create_api_router(state);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, service = %telemetry_config.service_name, "Starting tagstats API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("TAGSTATS_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("TAGSTATS_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
