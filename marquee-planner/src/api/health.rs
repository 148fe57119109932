//! Health and service status endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use marquee_common::config::{mask_secret, TomlConfig};
use serde::Serialize;

use crate::config::ApiKeys;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok" or "degraded")
    pub status: String,
    pub module: String,
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    pub uptime_seconds: u64,
    /// Last plan failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// One external collaborator's configuration
#[derive(Debug, Clone, Serialize)]
pub struct CollaboratorStatus {
    pub configured: bool,
    /// Masked API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CollaboratorStatus {
    fn new(key: Option<&str>, detail: Option<String>) -> Self {
        Self {
            configured: key.is_some(),
            key: key.map(mask_secret),
            detail,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannerStatus {
    pub max_iterations: u32,
    pub max_iterations_limit: u32,
    pub time_budget_secs: u64,
    pub verify_concurrency: usize,
    pub min_transfer_minutes: i64,
    pub check_opening_hours: bool,
}

/// GET /api/service-status body
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub openai: CollaboratorStatus,
    pub google_places: CollaboratorStatus,
    pub google_directions: CollaboratorStatus,
    pub planner: PlannerStatus,
}

impl ServiceStatus {
    pub fn new(config: &TomlConfig, keys: &ApiKeys) -> Self {
        let planner = &config.planner;
        Self {
            openai: CollaboratorStatus::new(keys.openai.as_deref(), Some(config.openai.model.clone())),
            google_places: CollaboratorStatus::new(keys.google_places.as_deref(), None),
            google_directions: CollaboratorStatus::new(keys.google_maps.as_deref(), None),
            planner: PlannerStatus {
                max_iterations: planner.max_iterations,
                max_iterations_limit: planner.max_iterations_limit,
                time_budget_secs: planner.time_budget_secs,
                verify_concurrency: planner.verify_concurrency,
                min_transfer_minutes: planner.min_transfer_minutes,
                check_opening_hours: planner.check_opening_hours,
            },
        }
    }

    pub fn all_configured(&self) -> bool {
        self.openai.configured && self.google_places.configured && self.google_directions.configured
    }
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let last_error = state.last_error.read().await.clone();
    let status = if state.status.all_configured() { "ok" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        module: "marquee-planner".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        uptime_seconds,
        last_error,
    })
}

/// GET /api/service-status
pub async fn service_status(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(state.status.as_ref().clone())
}

/// Build health and status routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/service-status", get(service_status))
}
