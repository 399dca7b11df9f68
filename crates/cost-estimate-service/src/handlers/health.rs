//! Health check handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Active coverage selection policy.
    pub selection_policy: String,
    /// Accumulator value basis.
    pub value_basis: String,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "cost-estimate".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        selection_policy: state.estimator.policy_name().to_string(),
        value_basis: state.config.estimator.value_basis.as_str().to_string(),
    })
}
