//! API key resolution for marquee-planner
//!
//! Each key resolves ENV → TOML. The Places key falls back to the Maps key.

use marquee_common::config::{resolve_api_key, TomlConfig};

pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
pub const GOOGLE_MAPS_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";
pub const GOOGLE_PLACES_KEY_ENV: &str = "GOOGLE_PLACES_API_KEY";

/// Resolved collaborator credentials (any may be absent)
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub google_maps: Option<String>,
    pub google_places: Option<String>,
}

impl ApiKeys {
    pub fn resolve(config: &TomlConfig) -> Self {
        let openai = resolve_api_key("OpenAI", OPENAI_KEY_ENV, config.openai.api_key.as_deref());
        let google_maps = resolve_api_key(
            "Google Maps",
            GOOGLE_MAPS_KEY_ENV,
            config.google.maps_api_key.as_deref(),
        );
        let google_places = resolve_api_key(
            "Google Places",
            GOOGLE_PLACES_KEY_ENV,
            config.google.places_api_key.as_deref(),
        )
        .or_else(|| {
            if google_maps.is_some() {
                tracing::info!("Google Places API key falling back to the Maps key");
            }
            google_maps.clone()
        });

        Self {
            openai,
            google_maps,
            google_places,
        }
    }
}
