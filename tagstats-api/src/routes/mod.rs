//! REST API Routes Module
//!
//! This module contains the route handlers:
//! - Hashtag statistics endpoints (users, map snapshot, trending list)
//! - Health check endpoints (Kubernetes-compatible)
//! - CORS support for browser-based clients

pub mod hashtag;
pub mod health;

use axum::{http::Method, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Compose the full application router.
///
/// Every endpoint is read-only, so CORS stays permissive and
/// GET-only.
pub fn create_api_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .nest("/hashtags", hashtag::create_router())
        .nest("/health", health::create_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
