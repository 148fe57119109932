//! Friendly plan summaries for the chat flow

use marquee_common::human_time::{format_distance, format_duration};
use std::sync::Arc;

use super::llm::{CompletionRequest, LanguageModel};
use crate::models::PlanOutcome;

const SUMMARY_TEMPERATURE: f32 = 0.7;
const SUMMARY_MAX_TOKENS: u32 = 800;

const SYSTEM_PROMPT: &str = "You are a friendly assistant describing an evening plan to the person \
who asked for it. Write plain prose, no JSON, no markdown headings.";

pub struct PlanSummarizer {
    llm: Arc<dyn LanguageModel>,
}

impl PlanSummarizer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Summarize a plan in 3-4 paragraphs, falling back to a one-line summary
    pub async fn summarize(&self, query: &str, outcome: &PlanOutcome) -> String {
        let request = CompletionRequest::new(SYSTEM_PROMPT, summary_prompt(query, outcome))
            .temperature(SUMMARY_TEMPERATURE)
            .max_tokens(SUMMARY_MAX_TOKENS);

        match self.llm.complete(request).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => fallback_summary(query, outcome),
            Err(e) => {
                tracing::warn!(error = %e, "Plan summary failed, using fallback");
                fallback_summary(query, outcome)
            }
        }
    }
}

pub fn fallback_summary(query: &str, outcome: &PlanOutcome) -> String {
    format!(
        "Plan for {} with {} events",
        query.trim(),
        outcome.itinerary.events.len()
    )
}

/// Facts handed to the model for summarizing
pub fn summary_prompt(query: &str, outcome: &PlanOutcome) -> String {
    let itinerary = &outcome.itinerary;
    let mut prompt = format!(
        "Create a friendly, conversational summary of this plan for the request \"{}\". \
         Use 3-4 short paragraphs. Mention each stop, its time, and how to get between stops.\n\n",
        query.trim()
    );

    prompt.push_str("Schedule:\n");
    for event in itinerary.events_chronological() {
        let venue = itinerary
            .venue_of(event)
            .map(|v| format!("{} ({})", v.name, v.address))
            .unwrap_or_else(|| "unknown venue".to_string());
        prompt.push_str(&format!(
            "- {} to {}: {} at {}",
            event.start_time.format("%H:%M"),
            event.end_time.format("%H:%M"),
            event.name,
            venue
        ));
        if let Some(price) = event.price {
            prompt.push_str(&format!(", ${:.2}", price));
        }
        prompt.push('\n');
    }

    if !itinerary.routes.is_empty() {
        prompt.push_str("\nTravel:\n");
        for route in &itinerary.routes {
            let from = itinerary.event(&route.origin_event_id).map(|e| e.name.as_str()).unwrap_or("?");
            let to = itinerary
                .event(&route.destination_event_id)
                .map(|e| e.name.as_str())
                .unwrap_or("?");
            match (route.distance_meters, route.duration_seconds) {
                (Some(distance), Some(duration)) if distance > 0 => prompt.push_str(&format!(
                    "- {} to {}: {} by {}, {}\n",
                    from,
                    to,
                    format_distance(distance),
                    route.travel_mode,
                    format_duration(duration)
                )),
                (Some(0), _) => prompt.push_str(&format!("- {} to {}: same venue\n", from, to)),
                _ => prompt.push_str(&format!("- {} to {}: by {}\n", from, to, route.travel_mode)),
            }
        }
    }

    prompt.push_str(&format!("\nTotal cost: ${:.2}\n", itinerary.total_cost()));
    if !itinerary.issues.is_empty() {
        prompt.push_str("\nMention these caveats gently:\n");
        for issue in &itinerary.issues {
            prompt.push_str(&format!("- {}\n", issue));
        }
    }
    prompt
}
