//! OpenAPI Documentation
//!
//! Aggregates the route annotations and component schemas into one
//! OpenAPI document.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::hashtag::HashtagListResponse;
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use tagstats_core::UserStats;

/// OpenAPI document for the tagstats API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "tagstats API",
        description = "Per-hashtag crowd-mapping campaign statistics"
    ),
    paths(
        crate::routes::hashtag::hashtag_users,
        crate::routes::hashtag::hashtag_map,
        crate::routes::hashtag::list_hashtags,
        crate::routes::health::ping,
        crate::routes::health::liveness,
        crate::routes::health::readiness,
    ),
    components(schemas(
        UserStats,
        HashtagListResponse,
        ApiError,
        ErrorCode,
        HealthResponse,
        HealthStatus,
        HealthDetails,
        ComponentHealth,
    )),
    tags(
        (name = "Hashtags", description = "Campaign hashtag statistics"),
        (name = "Health", description = "Service health checks"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_all_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();

        assert!(paths.contains(&"/hashtags".to_string()));
        assert!(paths.contains(&"/hashtags/{id}/users".to_string()));
        assert!(paths.contains(&"/hashtags/{id}/map".to_string()));
        assert!(paths.contains(&"/health/ready".to_string()));
    }
}
