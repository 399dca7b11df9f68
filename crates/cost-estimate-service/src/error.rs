//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use cost_estimate_core::{ClaimLineError, CostShareError};
use cost_estimate_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - the accumulators kept changing underneath the request.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The input is well-formed but cannot be priced.
    #[error("{message}")]
    Unprocessable {
        /// Machine-readable error code.
        code: &'static str,
        /// Human-readable message.
        message: String,
        /// Claim line and field at fault.
        details: Option<serde_json::Value>,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            Self::Unprocessable {
                code,
                message,
                details,
            } => (StatusCode::UNPROCESSABLE_ENTITY, code, message, details),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<CostShareError> for ApiError {
    fn from(err: CostShareError) -> Self {
        if err.is_defect() {
            return Self::Internal(err.to_string());
        }
        Self::Unprocessable {
            code: err.code(),
            message: err.to_string(),
            details: Some(serde_json::json!({ "field": err.field() })),
        }
    }
}

impl From<ClaimLineError> for ApiError {
    fn from(err: ClaimLineError) -> Self {
        if err.source.is_defect() {
            return Self::Internal(err.to_string());
        }
        Self::Unprocessable {
            code: err.source.code(),
            message: err.to_string(),
            details: Some(serde_json::json!({
                "claimLineId": err.claim_line_id,
                "field": err.source.field(),
            })),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound("accumulators not found".into()),
            StoreError::VersionConflict { .. } => Self::Conflict(err.to_string()),
            StoreError::Ledger(source) => source.into(),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
