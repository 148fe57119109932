//! Plan request types

use chrono::NaiveDateTime;
use marquee_common::time::wall_clock_opt;
use marquee_common::Coordinates;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Travel mode for routes between events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportMode {
    Walking,
    Driving,
    Transit,
    Bicycling,
}

impl TransportMode {
    /// Value of the Directions API `mode` parameter
    pub fn as_api_param(&self) -> &'static str {
        match self {
            TransportMode::Walking => "walking",
            TransportMode::Driving => "driving",
            TransportMode::Transit => "transit",
            TransportMode::Bicycling => "bicycling",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_param())
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walking" | "walk" => Ok(TransportMode::Walking),
            "driving" | "drive" => Ok(TransportMode::Driving),
            "transit" => Ok(TransportMode::Transit),
            "bicycling" | "bicycle" | "cycling" => Ok(TransportMode::Bicycling),
            other => Err(format!(
                "unknown transport mode '{}' (expected WALKING, DRIVING, TRANSIT or BICYCLING)",
                other
            )),
        }
    }
}

// Model output and callers both use assorted casings
impl<'de> Deserialize<'de> for TransportMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Caller constraints on a plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Spending ceiling for the whole plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,

    /// No event may start before this time
    #[serde(default, with = "wall_clock_opt", skip_serializing_if = "Option::is_none")]
    pub start_after: Option<NaiveDateTime>,

    /// No event may end after this time
    #[serde(default, with = "wall_clock_opt", skip_serializing_if = "Option::is_none")]
    pub end_before: Option<NaiveDateTime>,

    /// User location, used as the search bias for places lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.budget.is_none()
            && self.start_after.is_none()
            && self.end_before.is_none()
            && self.location.is_none()
    }
}

/// One incoming plan request
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub query: String,
    pub transport_mode: TransportMode,
    pub constraints: Constraints,
    /// Refinement passes allowed; `None` uses the configured default
    pub max_iterations: Option<u32>,
}

impl PlanRequest {
    pub fn new(query: impl Into<String>, transport_mode: TransportMode) -> Self {
        Self {
            query: query.into(),
            transport_mode,
            constraints: Constraints::default(),
            max_iterations: None,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}
