//! Error types for marquee-planner

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::llm::LlmError;

/// Fatal plan orchestration errors
///
/// Per-entity verification failures never appear here; they are recorded as
/// issues on the itinerary.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Language model unreachable or errored while drafting the plan
    #[error("Plan generation failed: {0}")]
    Generation(#[source] LlmError),

    /// Language model unreachable or errored while correcting the plan
    #[error("Plan refinement failed: {0}")]
    Refinement(#[source] LlmError),

    /// Model output is not an itinerary
    #[error("Model response is not a valid itinerary: {0}")]
    Format(String),

    #[error("Invalid plan request: {0}")]
    InvalidRequest(String),

    /// Wall-clock budget ran out before any itinerary existed
    #[error("Plan time budget of {0}s exhausted")]
    Timeout(u64),
}

impl PlanError {
    /// Stable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::Generation(_) => "GENERATION_ERROR",
            PlanError::Refinement(_) => "REFINEMENT_ERROR",
            PlanError::Format(_) => "FORMAT_ERROR",
            PlanError::InvalidRequest(_) => "BAD_REQUEST",
            PlanError::Timeout(_) => "TIMEOUT",
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Plan failure (502 upstream, 504 timeout, 400 invalid request)
    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Plan(ref err) => {
                let status = match err {
                    PlanError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                    PlanError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    PlanError::Generation(_) | PlanError::Refinement(_) | PlanError::Format(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                };
                (status, err.code(), err.to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "code": error_code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
