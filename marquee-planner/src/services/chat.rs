//! Conversational front door to the planner

use marquee_common::Coordinates;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};

use super::plan_orchestrator::PlanOrchestrator;
use super::plan_summarizer::PlanSummarizer;
use crate::error::PlanError;
use crate::models::{Constraints, PlanOutcome, PlanRequest, TransportMode};

const FOOD_KEYWORDS: &[&str] = &["dinner", "lunch", "breakfast", "food", "restaurant", "eat", "dining"];

const CUISINES: &[&str] = &[
    "italian",
    "french",
    "chinese",
    "japanese",
    "mexican",
    "indian",
    "thai",
    "vietnamese",
    "greek",
    "mediterranean",
    "spanish",
    "korean",
    "american",
    "bbq",
    "vegetarian",
    "vegan",
    "seafood",
];

pub const CUISINE_CLARIFICATION: &str = "I'd be happy to help you find a great place to eat! \
What type of cuisine are you interested in? For example, Italian, Japanese, American, vegetarian, etc. \
Also, do you have any price range preferences?";

pub const APOLOGY: &str =
    "I'm sorry, but I encountered an error while processing your request. Please try again.";

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanOutcome>,
    pub needs_clarification: bool,
}

impl ChatReply {
    fn text(response: impl Into<String>, needs_clarification: bool) -> Self {
        Self {
            response: response.into(),
            plan: None,
            needs_clarification,
        }
    }
}

pub struct ChatService {
    orchestrator: Arc<PlanOrchestrator>,
    summarizer: PlanSummarizer,
    default_mode: TransportMode,
}

impl ChatService {
    pub fn new(orchestrator: Arc<PlanOrchestrator>, summarizer: PlanSummarizer) -> Self {
        Self {
            orchestrator,
            summarizer,
            default_mode: TransportMode::Transit,
        }
    }

    /// Answer one chat message
    ///
    /// Only a blank message is an error. Planner failures become an apology.
    pub async fn respond(
        &self,
        message: &str,
        location: Option<Coordinates>,
    ) -> Result<ChatReply, PlanError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(PlanError::InvalidRequest("message must not be empty".to_string()));
        }

        if is_food_query(message) && !has_specific_cuisine(message) {
            tracing::info!(message = %message, "Asking for cuisine before planning");
            return Ok(ChatReply::text(CUISINE_CLARIFICATION, true));
        }

        let constraints = Constraints {
            budget: extract_budget(message),
            location: location.filter(Coordinates::is_valid),
            ..Default::default()
        };
        let request = PlanRequest::new(message, self.default_mode).with_constraints(constraints);

        match self.orchestrator.run(request).await {
            Ok(outcome) => {
                let summary = self.summarizer.summarize(message, &outcome).await;
                Ok(ChatReply {
                    response: summary,
                    plan: Some(outcome),
                    needs_clarification: false,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat plan failed");
                Ok(ChatReply::text(APOLOGY, false))
            }
        }
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Whether a message asks about food or restaurants
///
/// Keywords match at word starts, so "eatery" counts and "theatre" does not.
pub fn is_food_query(message: &str) -> bool {
    words(message).any(|w| FOOD_KEYWORDS.iter().any(|k| w.starts_with(k)))
}

pub fn has_specific_cuisine(message: &str) -> bool {
    words(message).any(|w| CUISINES.contains(&w.as_str()))
}

static DOLLAR_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)").expect("valid regex"));

static AMOUNT_IN_DOLLARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:dollars|usd)").expect("valid regex"));

/// Budget written as `$150`, `$1,200.50`, `150 dollars` or `150USD`
pub fn extract_budget(text: &str) -> Option<f64> {
    [&*DOLLAR_AMOUNT, &*AMOUNT_IN_DOLLARS]
        .into_iter()
        .find_map(|pattern| pattern.captures(text))
        .and_then(|caps| caps[1].replace(',', "").parse().ok())
}
