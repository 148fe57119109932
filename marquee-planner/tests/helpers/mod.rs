//! Test helpers for marquee-planner integration tests
//!
//! Fakes for the external collaborators, plan fixtures in the model's JSON
//! shape, and builders wiring them into an orchestrator or router state.

#![allow(dead_code)]

pub mod fakes;

use marquee_common::config::{PlannerConfig, TomlConfig};
use marquee_planner::api::ServiceStatus;
use marquee_planner::config::ApiKeys;
use marquee_planner::models::Itinerary;
use marquee_planner::services::{
    OrchestratorSettings, PlanGenerator, PlanOrchestrator, PlanRefiner, PlanSummarizer,
    PlanVerifier, VerifierSettings,
};
use marquee_planner::AppState;
use serde_json::{json, Value};
use std::sync::Arc;

pub use fakes::{FakeDirections, FakeLanguageModel, FakePlaces};

/// Date every fixture event falls on (a Tuesday)
pub const DAY: &str = "2025-03-04";

pub fn at(time: &str) -> String {
    format!("{}T{}:00", DAY, time)
}

/// Plan in the JSON shape the model is asked to produce
#[derive(Debug, Clone, Default)]
pub struct PlanFixture {
    venues: Vec<Value>,
    events: Vec<Value>,
    routes: Vec<Value>,
}

impl PlanFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn venue(mut self, id: &str, name: &str) -> Self {
        self.venues.push(json!({ "id": id, "name": name, "address": "New York, NY" }));
        self
    }

    pub fn event(mut self, id: &str, venue_id: &str, name: &str, start: &str, end: &str, price: f64) -> Self {
        self.events.push(json!({
            "id": id,
            "venue_id": venue_id,
            "name": name,
            "start_time": at(start),
            "end_time": at(end),
            "price": price
        }));
        self
    }

    pub fn route(mut self, id: &str, from: &str, to: &str, mode: &str) -> Self {
        self.routes.push(json!({
            "id": id,
            "origin_event_id": from,
            "destination_event_id": to,
            "travel_mode": mode
        }));
        self
    }

    /// Rename a venue, keeping its id
    pub fn rename_venue(mut self, id: &str, name: &str) -> Self {
        for venue in self.venues.iter_mut().filter(|v| v["id"] == id) {
            venue["name"] = json!(name);
        }
        self
    }

    /// Move an event, keeping its id
    pub fn reschedule(mut self, id: &str, start: &str, end: &str) -> Self {
        for event in self.events.iter_mut().filter(|e| e["id"] == id) {
            event["start_time"] = json!(at(start));
            event["end_time"] = json!(at(end));
        }
        self
    }

    pub fn set_mode(mut self, route_id: &str, mode: &str) -> Self {
        for route in self.routes.iter_mut().filter(|r| r["id"] == route_id) {
            route["travel_mode"] = json!(mode);
        }
        self
    }

    pub fn to_json(&self) -> String {
        json!({ "venues": self.venues, "events": self.events, "routes": self.routes }).to_string()
    }
}

/// Dinner at Carmine's, then a show at the Majestic a short walk away
pub fn dinner_and_show() -> PlanFixture {
    PlanFixture::new()
        .venue("venue-1", "Carmine's")
        .venue("venue-2", "Majestic Theatre")
        .event("event-1", "venue-1", "Dinner at Carmine's", "18:00", "19:30", 60.0)
        .event("event-2", "venue-2", "The Phantom of the Opera", "20:00", "22:30", 129.5)
        .route("route-1", "event-1", "event-2", "WALKING")
}

/// Fakes plus builders over them
pub struct Harness {
    pub llm: Arc<FakeLanguageModel>,
    pub places: Arc<FakePlaces>,
    pub directions: Arc<FakeDirections>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_places(FakePlaces::broadway())
    }

    pub fn with_places(places: FakePlaces) -> Self {
        Self {
            llm: Arc::new(FakeLanguageModel::new()),
            places: Arc::new(places),
            directions: Arc::new(FakeDirections::new()),
        }
    }

    pub fn verifier(&self, settings: VerifierSettings) -> PlanVerifier {
        PlanVerifier::new(self.places.clone(), self.directions.clone(), settings)
    }

    pub fn orchestrator(&self) -> PlanOrchestrator {
        self.orchestrator_with(&PlannerConfig::default())
    }

    pub fn orchestrator_with(&self, config: &PlannerConfig) -> PlanOrchestrator {
        PlanOrchestrator::from_config(
            self.llm.clone(),
            self.places.clone(),
            self.directions.clone(),
            config,
        )
    }

    pub fn orchestrator_with_settings(&self, settings: OrchestratorSettings) -> PlanOrchestrator {
        PlanOrchestrator::new(
            PlanGenerator::new(self.llm.clone(), "New York City".to_string()),
            self.verifier(VerifierSettings::default()),
            PlanRefiner::new(self.llm.clone()),
            settings,
        )
    }

    /// Router state with no API keys configured
    pub fn app_state(&self) -> AppState {
        let config = TomlConfig::default();
        let keys = ApiKeys {
            openai: None,
            google_maps: None,
            google_places: None,
        };
        AppState::new(
            Arc::new(self.orchestrator_with(&config.planner)),
            PlanSummarizer::new(self.llm.clone()),
            ServiceStatus::new(&config, &keys),
        )
    }
}

/// Every route and event points at something that exists
pub fn assert_referentially_intact(itinerary: &Itinerary) {
    let dangling = itinerary.dangling_references();
    assert!(dangling.is_empty(), "dangling references: {:?}", dangling);
}
