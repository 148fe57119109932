//! Plan API handler
//!
//! POST /api/plan runs one orchestration and returns the itinerary, even when
//! issues remain.

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Constraints, Itinerary, PlanOutcome, PlanRequest, PlanState, TransportMode, VerificationRecord,
};
use crate::AppState;

/// POST /api/plan request
#[derive(Debug, Deserialize)]
pub struct PlanRequestBody {
    #[serde(default)]
    pub query: String,
    /// WALKING, DRIVING, TRANSIT or BICYCLING (default TRANSIT)
    #[serde(default)]
    pub transport_mode: Option<String>,
    #[serde(default)]
    pub max_iterations: Option<u32>,
    #[serde(default)]
    pub constraints: Constraints,
}

impl PlanRequestBody {
    pub fn into_plan_request(self) -> ApiResult<PlanRequest> {
        if self.query.trim().is_empty() {
            return Err(ApiError::BadRequest("query must not be empty".to_string()));
        }
        let mode = match self.transport_mode.as_deref() {
            None | Some("") => TransportMode::Transit,
            Some(raw) => raw.parse().map_err(ApiError::BadRequest)?,
        };

        let mut request = PlanRequest::new(self.query.trim(), mode).with_constraints(self.constraints);
        request.max_iterations = self.max_iterations;
        Ok(request)
    }
}

/// Itinerary with derived totals
#[derive(Debug, Serialize)]
pub struct PlanPayload {
    #[serde(flatten)]
    pub itinerary: Itinerary,
    pub total_cost: f64,
    pub total_duration_minutes: Option<i64>,
}

/// POST /api/plan response
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub success: bool,
    pub session_id: Uuid,
    pub status: PlanState,
    pub plan: PlanPayload,
    /// Remaining issue messages
    pub issues: Vec<String>,
    /// Refinement passes performed
    pub iterations: u32,
    pub verification_history: Vec<VerificationRecord>,
}

impl From<PlanOutcome> for PlanResponse {
    fn from(outcome: PlanOutcome) -> Self {
        let issues = outcome.itinerary.issues.iter().map(|i| i.message.clone()).collect();
        let total_cost = outcome.itinerary.total_cost();
        let total_duration_minutes = outcome.itinerary.total_duration_minutes();

        Self {
            success: true,
            session_id: outcome.session_id,
            status: outcome.status,
            plan: PlanPayload {
                itinerary: outcome.itinerary,
                total_cost,
                total_duration_minutes,
            },
            issues,
            iterations: outcome.iterations,
            verification_history: outcome.history,
        }
    }
}

/// POST /api/plan
pub async fn create_plan(
    State(state): State<AppState>,
    body: Result<Json<PlanRequestBody>, JsonRejection>,
) -> ApiResult<Json<PlanResponse>> {
    let Json(body) = body?;
    let request = body.into_plan_request()?;

    match state.orchestrator.run(request).await {
        Ok(outcome) => Ok(Json(PlanResponse::from(outcome))),
        Err(e) => {
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

/// Build plan routes
pub fn plan_routes() -> Router<AppState> {
    Router::new().route("/api/plan", post(create_plan))
}
