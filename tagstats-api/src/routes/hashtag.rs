//! Hashtag Statistics Endpoints
//!
//! - /hashtags/:id/users - per-user statistics for one campaign hashtag
//!   (served through the single-flight cache)
//! - /hashtags/:id/map - precomputed map snapshot elements
//! - /hashtags - known hashtags plus the trending list

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::cached_stats::CachedStatsClient;
use crate::config::ApiConfig;
use crate::db::DbClient;
use crate::error::{ApiError, ApiResult};
use crate::snapshot::{self, SnapshotStore};
use crate::state::AppState;
use crate::trend::TrendClient;
use tagstats_core::UserStats;

// ============================================================================
// TYPES
// ============================================================================

/// Response for the hashtag listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HashtagListResponse {
    /// Every hashtag known to the data store.
    pub hashtags: Vec<String>,
    /// Currently trending hashtags, most probable first.
    pub trending: Vec<String>,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /hashtags/:id/users - Per-user statistics for a hashtag
#[utoipa::path(
    get,
    path = "/hashtags/{id}/users",
    tag = "Hashtags",
    params(
        ("id" = String, Path, description = "Campaign hashtag, matched case-sensitively")
    ),
    responses(
        (status = 200, description = "Per-user statistics, unordered; empty for an unknown hashtag", body = [UserStats]),
        (status = 500, description = "Aggregation query failed", body = ApiError),
    ),
)]
pub async fn hashtag_users(
    State(stats): State<CachedStatsClient>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let records = stats.user_stats(&id).await?;
    Ok(Json(records))
}

/// GET /hashtags/:id/map - Map snapshot elements for a hashtag
#[utoipa::path(
    get,
    path = "/hashtags/{id}/map",
    tag = "Hashtags",
    params(
        ("id" = String, Path, description = "Campaign hashtag; snapshot keys are lowercased")
    ),
    responses(
        (status = 200, description = "Snapshot elements in list order"),
        (status = 500, description = "A snapshot element failed to decode", body = ApiError),
        (status = 503, description = "Snapshot store unavailable", body = ApiError),
    ),
)]
pub async fn hashtag_map(
    State(snapshots): State<SnapshotStore>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let elements = snapshots.read_list(&snapshot::map_key(&id)).await?;
    Ok(Json(elements))
}

/// GET /hashtags - Known hashtags plus the trending list
#[utoipa::path(
    get,
    path = "/hashtags",
    tag = "Hashtags",
    responses(
        (status = 200, description = "Hashtag listing", body = HashtagListResponse),
        (status = 502, description = "Trend service failed", body = ApiError),
        (status = 500, description = "Hashtag query failed", body = ApiError),
    ),
)]
pub async fn list_hashtags(
    State(db): State<DbClient>,
    State(trends): State<TrendClient>,
    State(config): State<ApiConfig>,
) -> ApiResult<impl IntoResponse> {
    // The hashtag list and the trend distribution are independent reads.
    let (hashtags, trending) = tokio::try_join!(
        db.hashtag_list(),
        trends.n_most_probable("hashtags", config.trend_count),
    )?;

    Ok(Json(HashtagListResponse { hashtags, trending }))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the hashtag router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_hashtags))
        .route("/:id/users", get(hashtag_users))
        .route("/:id/map", get(hashtag_map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashtag_list_response_serialization() -> Result<(), serde_json::Error> {
        let response = HashtagListResponse {
            hashtags: vec!["missingmaps".to_string(), "mapathon".to_string()],
            trending: vec!["missingmaps".to_string()],
        };

        let json = serde_json::to_string(&response)?;
        assert!(json.contains("\"hashtags\":[\"missingmaps\",\"mapathon\"]"));
        assert!(json.contains("\"trending\":[\"missingmaps\"]"));
        Ok(())
    }
}
