//! marquee-planner library interface
//!
//! Exposes the planner pipeline and HTTP router for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, PlanError};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::ServiceStatus;
use crate::services::{ChatService, PlanOrchestrator, PlanSummarizer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PlanOrchestrator>,
    pub chat: Arc<ChatService>,
    /// Collaborator configuration reported by `/api/service-status`
    pub status: Arc<ServiceStatus>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last plan failure, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(orchestrator: Arc<PlanOrchestrator>, summarizer: PlanSummarizer, status: ServiceStatus) -> Self {
        let chat = ChatService::new(Arc::clone(&orchestrator), summarizer);
        Self {
            orchestrator,
            chat: Arc::new(chat),
            status: Arc::new(status),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::plan_routes())
        .merge(api::chat_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
