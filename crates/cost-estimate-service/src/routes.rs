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

use crate::handlers::{accumulators, estimates, health};
use crate::state::AppState;

/// Maximum concurrent requests for estimate endpoints.
const ESTIMATE_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `POST /v1/cost-estimates` - Estimate member and insurer cost
/// - `GET /v1/members/:member_id/accumulators` - Current balances
/// - `PUT /v1/members/:member_id/accumulators` - Replace balances
/// - `POST /v1/members/:member_id/accumulators/apply` - Ledger preview
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let estimate_routes = Router::new()
        .route("/", post(estimates::create_estimate))
        .layer(ConcurrencyLimitLayer::new(ESTIMATE_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        .route(
            "/members/:member_id/accumulators",
            get(accumulators::get_accumulators).put(accumulators::replace_accumulators),
        )
        .route(
            "/members/:member_id/accumulators/apply",
            post(accumulators::apply_cost),
        )
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS))
        .nest("/cost-estimates", estimate_routes);

    Router::new()
        // Health (no rate limit)
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
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
