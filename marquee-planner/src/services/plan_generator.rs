//! Plan generator
//!
//! One language model call turning a free-text query into an itinerary.

use chrono::NaiveDateTime;
use marquee_common::time::{format_wall_clock, now_local};
use std::sync::Arc;

use super::itinerary_draft::parse_draft;
use super::llm::{CompletionRequest, LanguageModel};
use super::reconciler::reconcile;
use crate::error::PlanError;
use crate::models::{Constraints, Itinerary, TransportMode};

const GENERATION_TEMPERATURE: f32 = 0.7;

const ITINERARY_SHAPE: &str = r#"{
  "venues": [
    {
      "id": "venue-1",
      "name": "Exact venue name",
      "address": "Street address",
      "latitude": 40.7580,
      "longitude": -73.9855,
      "description": "Short description"
    }
  ],
  "events": [
    {
      "id": "event-1",
      "venue_id": "venue-1",
      "name": "Event name",
      "start_time": "YYYY-MM-DDTHH:MM:SS",
      "end_time": "YYYY-MM-DDTHH:MM:SS",
      "price": 0.0,
      "description": "Short description"
    }
  ],
  "routes": [
    {
      "id": "route-1",
      "origin_event_id": "event-1",
      "destination_event_id": "event-2",
      "travel_mode": "WALKING | DRIVING | TRANSIT | BICYCLING"
    }
  ]
}"#;

pub struct PlanGenerator {
    llm: Arc<dyn LanguageModel>,
    default_city: String,
}

impl PlanGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>, default_city: impl Into<String>) -> Self {
        Self {
            llm,
            default_city: default_city.into(),
        }
    }

    /// Draft an itinerary for a query
    pub async fn generate(
        &self,
        query: &str,
        mode: TransportMode,
        constraints: &Constraints,
    ) -> Result<Itinerary, PlanError> {
        if query.trim().is_empty() {
            return Err(PlanError::InvalidRequest("query must not be empty".to_string()));
        }

        let request = CompletionRequest::new(
            self.system_prompt(),
            generation_prompt(query, mode, constraints, now_local()),
        )
        .temperature(GENERATION_TEMPERATURE)
        .json();

        let text = self.llm.complete(request).await.map_err(PlanError::Generation)?;
        let draft = parse_draft(&text)?;
        let itinerary = reconcile(draft, None, mode);

        tracing::info!(
            venues = itinerary.venues.len(),
            events = itinerary.events.len(),
            routes = itinerary.routes.len(),
            "Generated initial itinerary"
        );
        Ok(itinerary)
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a helpful event planner for {city}. You know its restaurants, \
             theatres, Broadway shows and attractions. Always answer with a single JSON \
             object and nothing else.",
            city = self.default_city
        )
    }
}

/// User prompt for the initial itinerary
pub fn generation_prompt(
    query: &str,
    mode: TransportMode,
    constraints: &Constraints,
    now: NaiveDateTime,
) -> String {
    let mut prompt = format!(
        "Create a plan for this request: \"{query}\"\n\n\
         Current local time: {now}\n\
         Preferred travel mode: {mode}\n",
        query = query.trim(),
        now = format_wall_clock(&now),
        mode = mode.as_api_param().to_uppercase(),
    );

    prompt.push_str(&constraints_section(constraints));

    prompt.push_str(
        "\nRules:\n\
         - Use real venues that exist today, with their exact names and street addresses.\n\
         - Every event must reference a venue by venue_id.\n\
         - Times are local wall-clock times formatted YYYY-MM-DDTHH:MM:SS; plan for \
           today unless the request names another day.\n\
         - Leave enough time to travel between consecutive events.\n\
         - Include one route for each pair of consecutive events.\n\
         - Prices are per person in US dollars.\n\n\
         Respond with JSON in exactly this shape:\n",
    );
    prompt.push_str(ITINERARY_SHAPE);
    prompt
}

/// Constraint lines shared by generation and refinement prompts
pub fn constraints_section(constraints: &Constraints) -> String {
    let mut section = String::new();
    if let Some(budget) = constraints.budget {
        section.push_str(&format!("Total budget: ${:.2}\n", budget));
    }
    if let Some(after) = constraints.start_after {
        section.push_str(&format!("Start no earlier than: {}\n", format_wall_clock(&after)));
    }
    if let Some(before) = constraints.end_before {
        section.push_str(&format!("Finish no later than: {}\n", format_wall_clock(&before)));
    }
    if let Some(location) = constraints.location {
        section.push_str(&format!("User location: {}\n", location));
    }
    section
}
