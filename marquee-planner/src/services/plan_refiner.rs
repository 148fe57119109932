//! Plan refiner
//!
//! Sends the current itinerary and its issues back to the language model and
//! reconciles the corrected draft against the itinerary it replaces.

use marquee_common::time::{format_wall_clock, now_local};
use serde::Serialize;
use std::sync::Arc;

use super::itinerary_draft::parse_draft;
use super::llm::{CompletionRequest, LanguageModel};
use super::plan_generator::constraints_section;
use super::reconciler::reconcile;
use crate::error::PlanError;
use crate::models::{Constraints, Event, Issue, Itinerary, Route, TransportMode, Venue};

const REFINEMENT_TEMPERATURE: f32 = 0.3;
const REFINEMENT_MAX_TOKENS: u32 = 3000;

const SYSTEM_PROMPT: &str = "You correct event itineraries. You receive an itinerary as JSON \
and a list of problems found by checking it against real maps data. Fix exactly those problems, \
keep everything else unchanged, and answer with the complete corrected itinerary as a single JSON object.";

const TIMING_RULES: &str = "Timing rules:
- Dinner lasts about 90 minutes, lunch about 60 minutes.
- Arrive at shows at least 30 minutes before curtain and at restaurants 15 minutes before the reservation.
- Allow 5 to 15 minutes of waiting when travelling by transit.
- When there is not enough time to travel, move the later event, end the earlier one sooner, or choose a faster travel_mode.
- When a venue cannot be found, replace it with a real venue of the same kind and give its exact name and address.
- Keep every id that is still in use. Reuse venue_id and event ids in routes.";

/// Itinerary fields the model is shown
#[derive(Serialize)]
struct PromptItinerary<'a> {
    venues: &'a [Venue],
    events: &'a [Event],
    routes: &'a [Route],
}

pub struct PlanRefiner {
    llm: Arc<dyn LanguageModel>,
}

impl PlanRefiner {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Ask for a corrected itinerary
    ///
    /// The result has ids reconciled against `itinerary` and an iteration
    /// count one higher.
    pub async fn refine(
        &self,
        itinerary: &Itinerary,
        issues: &[Issue],
        mode: TransportMode,
        constraints: &Constraints,
    ) -> Result<Itinerary, PlanError> {
        let prompt = refinement_prompt(itinerary, issues, constraints)?;
        let request = CompletionRequest::new(SYSTEM_PROMPT, prompt)
            .temperature(REFINEMENT_TEMPERATURE)
            .max_tokens(REFINEMENT_MAX_TOKENS)
            .json();

        let text = self.llm.complete(request).await.map_err(PlanError::Refinement)?;
        let draft = parse_draft(&text)?;

        let mut refined = reconcile(draft, Some(itinerary), mode);
        refined.iteration_count = itinerary.iteration_count + 1;

        tracing::info!(
            iteration = refined.iteration_count,
            venues = refined.venues.len(),
            events = refined.events.len(),
            routes = refined.routes.len(),
            "Refined itinerary"
        );
        Ok(refined)
    }
}

/// User prompt for one refinement pass
pub fn refinement_prompt(
    itinerary: &Itinerary,
    issues: &[Issue],
    constraints: &Constraints,
) -> Result<String, PlanError> {
    let current = serde_json::to_string_pretty(&PromptItinerary {
        venues: &itinerary.venues,
        events: &itinerary.events,
        routes: &itinerary.routes,
    })
    .map_err(|e| PlanError::Format(e.to_string()))?;

    let problems: String = issues
        .iter()
        .enumerate()
        .map(|(i, issue)| format!("{}. {}\n", i + 1, issue))
        .collect();

    Ok(format!(
        "Current local time: {now}\n\n\
         Current itinerary:\n{current}\n\n\
         Problems to fix:\n{problems}\n\
         {constraints}\
         {rules}\n\n\
         Respond with the corrected itinerary using the same JSON shape \
         (venues, events, routes).",
        now = format_wall_clock(&now_local()),
        current = current,
        problems = problems,
        constraints = constraints_section(constraints),
        rules = TIMING_RULES,
    ))
}
