//! Itinerary drafts parsed from language model output
//!
//! A draft is the model's view of an itinerary before reconciliation: ids may be
//! missing, duplicated or numeric, and references may use names instead of ids.

use chrono::NaiveDateTime;
use marquee_common::time::wall_clock;
use marquee_common::Coordinates;
use serde::{Deserialize, Deserializer};

use crate::error::PlanError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItineraryDraft {
    #[serde(default)]
    pub venues: Vec<DraftVenue>,
    #[serde(default)]
    pub events: Vec<DraftEvent>,
    #[serde(default)]
    pub routes: Vec<DraftRoute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftVenue {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub price_level: Option<u8>,
}

impl DraftVenue {
    /// Claimed coordinates, nested or flat
    pub fn claimed_coordinates(&self) -> Option<Coordinates> {
        self.coordinates
            .or_else(|| Some(Coordinates::new(self.latitude?, self.longitude?)))
            .filter(Coordinates::is_valid)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftEvent {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub venue_id: Option<String>,
    #[serde(default, alias = "venue")]
    pub venue_name: Option<String>,
    pub name: String,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveDateTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftRoute {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, alias = "from", alias = "origin", deserialize_with = "lenient_id")]
    pub origin_event_id: Option<String>,
    #[serde(default, alias = "to", alias = "destination", deserialize_with = "lenient_id")]
    pub destination_event_id: Option<String>,
    /// Parsed leniently; unknown modes fall back to the requested mode
    #[serde(default)]
    pub travel_mode: Option<String>,
}

/// Accept ids given as strings or integers; blank strings become `None`
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(RawId::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Locate the JSON object in a model response
///
/// Code fences and surrounding prose fall outside the outermost braces.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model response into a draft
pub fn parse_draft(text: &str) -> Result<ItineraryDraft, PlanError> {
    let json = extract_json(text)
        .ok_or_else(|| PlanError::Format("response contains no JSON object".to_string()))?;
    serde_json::from_str(json).map_err(|e| PlanError::Format(e.to_string()))
}
