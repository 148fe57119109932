//! Planner services
//!
//! Collaborator traits ([`LanguageModel`], [`PlacesService`],
//! [`DirectionsService`]) with their HTTP clients, and the generate → verify →
//! refine pipeline built on them.

pub mod chat;
pub mod google_directions_client;
pub mod google_places_client;
pub mod itinerary_draft;
pub mod llm;
pub mod maps;
pub mod openai_client;
pub mod plan_generator;
pub mod plan_orchestrator;
pub mod plan_refiner;
pub mod plan_summarizer;
pub mod plan_verifier;
pub mod reconciler;

pub use chat::{ChatReply, ChatService};
pub use google_directions_client::GoogleDirectionsClient;
pub use google_places_client::GooglePlacesClient;
pub use llm::{CompletionRequest, LanguageModel, LlmError};
pub use maps::{Directions, DirectionsService, MapsError, PlaceCandidate, PlacesService};
pub use openai_client::OpenAiClient;
pub use plan_generator::PlanGenerator;
pub use plan_orchestrator::{OrchestratorSettings, PlanOrchestrator};
pub use plan_refiner::PlanRefiner;
pub use plan_summarizer::PlanSummarizer;
pub use plan_verifier::{PlanVerifier, VerifierSettings};
