//! Chat API handler

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use marquee_common::Coordinates;
use serde::{Deserialize, Serialize};

use super::plan::PlanResponse;
use crate::error::ApiResult;
use crate::AppState;

/// POST /api/chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub location: Option<Coordinates>,
}

/// POST /api/chat response
#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub success: bool,
    pub response: String,
    pub needs_clarification: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanResponse>,
}

/// POST /api/chat
///
/// Returns 200 with an apology when planning fails; only a blank message is
/// rejected.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequestBody>, JsonRejection>,
) -> ApiResult<Json<ChatResponseBody>> {
    let Json(body) = body?;
    let reply = state.chat.respond(&body.message, body.location).await?;

    let success = reply.plan.is_some() || reply.needs_clarification;
    if !success {
        state.record_error(format!("Chat plan failed for: {}", body.message.trim())).await;
    }

    Ok(Json(ChatResponseBody {
        success,
        response: reply.response,
        needs_clarification: reply.needs_clarification,
        plan: reply.plan.map(PlanResponse::from),
    }))
}

/// Build chat routes
pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/api/chat", post(chat))
}
