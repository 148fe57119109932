//! HTTP API handlers for marquee-planner

pub mod chat;
pub mod health;
pub mod plan;

pub use chat::chat_routes;
pub use health::{health_routes, ServiceStatus};
pub use plan::{plan_routes, PlanResponse};
