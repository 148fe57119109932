//! Maps collaborators
//!
//! Places text search and directions lookups used by the plan verifier.

use async_trait::async_trait;
use marquee_common::Coordinates;
use thiserror::Error;

use crate::models::{OpeningHours, TransportMode};

/// Places/directions client errors
#[derive(Debug, Error)]
pub enum MapsError {
    #[error("Maps service not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Non-OK `status` field in an otherwise successful response
    #[error("Service status {0}")]
    Status(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// One places search result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceCandidate {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub coordinates: Option<Coordinates>,
    pub types: Vec<String>,
    pub rating: Option<f32>,
    pub business_status: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub price_level: Option<u8>,
    pub opening_hours: Option<OpeningHours>,
}

/// Directions for one leg
#[derive(Debug, Clone, PartialEq)]
pub struct Directions {
    pub distance_meters: u64,
    pub duration_seconds: u64,
    /// Plain-text turn-by-turn instructions
    pub steps: Vec<String>,
}

#[async_trait]
pub trait PlacesService: Send + Sync {
    fn is_configured(&self) -> bool {
        true
    }

    /// Free-text place search, optionally biased towards a location
    async fn search_text(
        &self,
        query: &str,
        near: Option<Coordinates>,
    ) -> Result<Vec<PlaceCandidate>, MapsError>;
}

#[async_trait]
pub trait DirectionsService: Send + Sync {
    fn is_configured(&self) -> bool {
        true
    }

    /// Directions between two points
    ///
    /// `Ok(None)` means the service answered but found no route.
    async fn directions(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TransportMode,
    ) -> Result<Option<Directions>, MapsError>;
}
