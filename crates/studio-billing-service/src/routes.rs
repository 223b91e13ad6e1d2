//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{credits, health, kling, merge_face, seedream, usage, webhooks};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for ledger endpoints.
const LEDGER_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for generation endpoints. These hold an
/// outbound provider call open for their duration, so the limit is tighter.
const GENERATION_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Ledger
/// - `POST /consume` - Debit credits and record usage
/// - `POST /webhook/subscription-update` - Subscription ingestion
/// - `GET /usage/{wp_user_id}` - Entitlement and recent usage report
///
/// ## Generation gateway
/// - `POST /api/kling/v2-5/t2v/generate`, `GET /api/kling/v2-5/t2v/status/{task_id}`
/// - `POST /api/kling/v2-5/i2v/generate`, `GET /api/kling/v2-5/i2v/status/{task_id}`
/// - `POST /api/seedream/3/t2i/generate`
/// - `POST /api/novita/merge-face/generate`
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let ledger_routes = Router::new()
        .route("/consume", post(credits::consume))
        .route(
            "/webhook/subscription-update",
            post(webhooks::subscription_update),
        )
        .route("/usage/:wp_user_id", get(usage::usage_report))
        .layer(ConcurrencyLimitLayer::new(LEDGER_MAX_CONCURRENT_REQUESTS));

    let t2v_routes = Router::new()
        .route("/generate", post(kling::generate_t2v))
        .route("/status/:task_id", get(kling::task_status));

    let i2v_routes = Router::new()
        .route("/generate", post(kling::generate_i2v))
        .route("/status/:task_id", get(kling::task_status));

    let generation_routes = Router::new()
        .nest("/kling/v2-5/t2v", t2v_routes)
        .nest("/kling/v2-5/i2v", i2v_routes)
        .route("/seedream/3/t2i/generate", post(seedream::generate))
        .route("/novita/merge-face/generate", post(merge_face::generate))
        .layer(ConcurrencyLimitLayer::new(
            GENERATION_MAX_CONCURRENT_REQUESTS,
        ));

    Router::new()
        // Health (public, no limit)
        .route("/health", get(health::health))
        // Ledger routes at the root, matching the production mounts
        .merge(ledger_routes)
        // Generation gateway
        .nest("/api", generation_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
