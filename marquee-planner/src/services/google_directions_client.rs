//! Google Directions API client
//!
//! Responses are cached by (origin, destination, mode) so that refinement
//! passes re-verifying unchanged legs do not repeat the request.

use async_trait::async_trait;
use marquee_common::config::GoogleConfig;
use marquee_common::Coordinates;
use moka::sync::Cache;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

use super::maps::{Directions, DirectionsService, MapsError};
use crate::models::TransportMode;

const USER_AGENT: &str = concat!("marquee-planner/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LegKey {
    origin: String,
    destination: String,
    mode: TransportMode,
}

impl LegKey {
    fn new(origin: Coordinates, destination: Coordinates, mode: TransportMode) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            mode,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    #[serde(default)]
    legs: Vec<ApiLeg>,
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    distance: ValueText,
    duration: ValueText,
    #[serde(default)]
    steps: Vec<ApiStep>,
}

#[derive(Debug, Deserialize)]
struct ValueText {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct ApiStep {
    #[serde(default)]
    html_instructions: String,
}

/// Parse a Directions API JSON body
///
/// `ZERO_RESULTS` and `NOT_FOUND` yield `Ok(None)`; other non-OK statuses are
/// errors. Multi-leg routes are summed.
pub fn parse_directions_response(body: &str) -> Result<Option<Directions>, MapsError> {
    let response: DirectionsResponse =
        serde_json::from_str(body).map_err(|e| MapsError::ParseError(e.to_string()))?;

    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" | "NOT_FOUND" => return Ok(None),
        other => {
            let detail = response.error_message.unwrap_or_default();
            return Err(MapsError::Status(format!("{} {}", other, detail).trim().to_string()));
        }
    }

    let Some(route) = response.routes.into_iter().next() else {
        return Ok(None);
    };
    if route.legs.is_empty() {
        return Ok(None);
    }

    let mut directions = Directions {
        distance_meters: 0,
        duration_seconds: 0,
        steps: Vec::new(),
    };
    for leg in route.legs {
        directions.distance_meters += leg.distance.value;
        directions.duration_seconds += leg.duration.value;
        directions.steps.extend(
            leg.steps
                .iter()
                .map(|s| strip_html(&s.html_instructions))
                .filter(|s| !s.is_empty()),
        );
    }
    Ok(Some(directions))
}

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Convert an HTML instruction fragment to plain text
pub fn strip_html(html: &str) -> String {
    let text = HTML_TAG
        .replace_all(html, " ")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">");

    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Google Directions client
pub struct GoogleDirectionsClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    cache: Cache<LegKey, Option<Directions>>,
}

impl GoogleDirectionsClient {
    pub fn new(config: &GoogleConfig, api_key: Option<String>) -> Result<Self, MapsError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MapsError::NetworkError(e.to_string()))?;

        let cache = Cache::builder()
            .max_capacity(config.directions_cache_size)
            .time_to_live(Duration::from_secs(config.directions_cache_ttl_secs))
            .build();

        Ok(Self {
            http_client,
            api_key,
            base_url: config.directions_base_url.clone(),
            cache,
        })
    }

    pub fn cached_entries(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

#[async_trait]
impl DirectionsService for GoogleDirectionsClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn directions(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        mode: TransportMode,
    ) -> Result<Option<Directions>, MapsError> {
        let key = LegKey::new(origin, destination, mode);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(origin = %origin, destination = %destination, mode = %mode, "Directions cache hit");
            return Ok(hit);
        }

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            MapsError::NotConfigured("GOOGLE_MAPS_API_KEY is not set".to_string())
        })?;

        tracing::debug!(origin = %origin, destination = %destination, mode = %mode, "Requesting directions");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("origin", key.origin.as_str()),
                ("destination", key.destination.as_str()),
                ("mode", mode.as_api_param()),
                ("key", api_key),
            ])
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

        let directions = parse_directions_response(&text)?;
        self.cache.insert(key, directions.clone());
        Ok(directions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "status": "OK",
      "routes": [{
        "legs": [{
          "distance": {"text": "0.4 km", "value": 420},
          "duration": {"text": "6 mins", "value": 355},
          "steps": [
            {"html_instructions": "Head <b>west</b> on <b>W 44th St</b>"},
            {"html_instructions": "Turn <b>left</b><div style=\"font-size:0.9em\">Destination will be on the right</div>"}
          ]
        }]
      }]
    }"#;

    #[test]
    fn test_parse_ok_response() {
        let directions = parse_directions_response(SAMPLE).unwrap().unwrap();
        assert_eq!(directions.distance_meters, 420);
        assert_eq!(directions.duration_seconds, 355);
        assert_eq!(
            directions.steps,
            vec![
                "Head west on W 44th St".to_string(),
                "Turn left Destination will be on the right".to_string(),
            ]
        );
    }

    #[test]
    fn test_zero_results_is_none() {
        let body = r#"{"status": "ZERO_RESULTS", "routes": []}"#;
        assert_eq!(parse_directions_response(body).unwrap(), None);
    }

    #[test]
    fn test_denied_is_status_error() {
        let body = r#"{"status": "REQUEST_DENIED", "error_message": "bad key", "routes": []}"#;
        match parse_directions_response(body) {
            Err(MapsError::Status(msg)) => assert_eq!(msg, "REQUEST_DENIED bad key"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_strip_html_entities() {
        assert_eq!(strip_html("Cross&nbsp;<b>7th Ave</b> &amp; walk"), "Cross 7th Ave & walk");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_strip_html_nested_markup() {
        let html = "Turn <b>left</b> onto <b>W 44th St</b><div style=\"font-size:0.9em\">Destination will be on the right</div>";
        assert_eq!(
            strip_html(html),
            "Turn left onto W 44th St Destination will be on the right"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_client() {
        let client = GoogleDirectionsClient::new(&GoogleConfig::default(), None).unwrap();
        assert!(!client.is_configured());
        let a = Coordinates::new(40.75, -73.98);
        let b = Coordinates::new(40.76, -73.99);
        let result = client.directions(a, b, TransportMode::Walking).await;
        assert!(matches!(result, Err(MapsError::NotConfigured(_))));
        assert_eq!(client.cached_entries(), 0);
    }
}
