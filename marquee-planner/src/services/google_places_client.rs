//! Google Places API (New) text search client

use async_trait::async_trait;
use marquee_common::config::GoogleConfig;
use marquee_common::Coordinates;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::maps::{MapsError, PlaceCandidate, PlacesService};
use crate::models::{OpeningHours, OpeningPeriod};

const USER_AGENT: &str = concat!("marquee-planner/", env!("CARGO_PKG_VERSION"));
const MAX_RESULTS: u32 = 10;
const LOCATION_BIAS_RADIUS_METERS: f64 = 5000.0;

const FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,places.location,\
places.types,places.rating,places.businessStatus,places.regularOpeningHours,\
places.nationalPhoneNumber,places.websiteUri,places.priceLevel";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextRequest<'a> {
    text_query: &'a str,
    max_result_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    location_bias: Option<LocationBias>,
}

#[derive(Debug, Serialize)]
struct LocationBias {
    circle: Circle,
}

#[derive(Debug, Serialize)]
struct Circle {
    center: LatLng,
    radius: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct SearchTextResponse {
    #[serde(default)]
    places: Vec<ApiPlace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPlace {
    id: String,
    #[serde(default)]
    display_name: Option<LocalizedText>,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    location: Option<LatLng>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    rating: Option<f32>,
    #[serde(default)]
    business_status: Option<String>,
    #[serde(default)]
    regular_opening_hours: Option<ApiOpeningHours>,
    #[serde(default)]
    national_phone_number: Option<String>,
    #[serde(default)]
    website_uri: Option<String>,
    #[serde(default)]
    price_level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiOpeningHours {
    #[serde(default)]
    periods: Vec<OpeningPeriod>,
    #[serde(default)]
    weekday_descriptions: Vec<String>,
}

/// Parse a `places:searchText` response body
pub fn parse_search_response(body: &str) -> Result<Vec<PlaceCandidate>, MapsError> {
    let response: SearchTextResponse =
        serde_json::from_str(body).map_err(|e| MapsError::ParseError(e.to_string()))?;

    Ok(response
        .places
        .into_iter()
        .map(|p| PlaceCandidate {
            name: p.display_name.map(|n| n.text).unwrap_or_default(),
            address: p.formatted_address.unwrap_or_default(),
            coordinates: p
                .location
                .map(|l| Coordinates::new(l.latitude, l.longitude))
                .filter(Coordinates::is_valid),
            types: p.types,
            rating: p.rating,
            business_status: p.business_status,
            phone: p.national_phone_number,
            website: p.website_uri,
            price_level: p.price_level.as_deref().and_then(price_level_ordinal),
            opening_hours: p.regular_opening_hours.map(|h| OpeningHours {
                weekday_text: h.weekday_descriptions,
                periods: h.periods,
            }),
            place_id: p.id,
        })
        .collect())
}

fn price_level_ordinal(level: &str) -> Option<u8> {
    match level {
        "PRICE_LEVEL_FREE" => Some(0),
        "PRICE_LEVEL_INEXPENSIVE" => Some(1),
        "PRICE_LEVEL_MODERATE" => Some(2),
        "PRICE_LEVEL_EXPENSIVE" => Some(3),
        "PRICE_LEVEL_VERY_EXPENSIVE" => Some(4),
        _ => None,
    }
}

/// Google Places client
pub struct GooglePlacesClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GooglePlacesClient {
    pub fn new(config: &GoogleConfig, api_key: Option<String>) -> Result<Self, MapsError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MapsError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: config.places_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PlacesService for GooglePlacesClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search_text(
        &self,
        query: &str,
        near: Option<Coordinates>,
    ) -> Result<Vec<PlaceCandidate>, MapsError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            MapsError::NotConfigured("GOOGLE_PLACES_API_KEY is not set".to_string())
        })?;

        let body = SearchTextRequest {
            text_query: query,
            max_result_count: MAX_RESULTS,
            location_bias: near.map(|c| LocationBias {
                circle: Circle {
                    center: LatLng {
                        latitude: c.latitude,
                        longitude: c.longitude,
                    },
                    radius: LOCATION_BIAS_RADIUS_METERS,
                },
            }),
        };

        let url = format!("{}/places:searchText", self.base_url);
        tracing::debug!(query = %query, url = %url, "Searching places");

        let response = self
            .http_client
            .post(&url)
            .header("X-Goog-Api-Key", api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&body)
            .send()
            .await
            .map_err(|e| MapsError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MapsError::ApiError(status.as_u16(), error_text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| MapsError::NetworkError(e.to_string()))?;

        let candidates = parse_search_response(&text)?;
        tracing::debug!(query = %query, results = candidates.len(), "Places search complete");
        Ok(candidates)
    }
}
