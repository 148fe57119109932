//! Configuration loading and API key resolution
//!
//! Bootstrap configuration comes from a TOML file. The file is located by
//! priority order:
//! 1. Command-line argument (highest priority)
//! 2. `MARQUEE_CONFIG` environment variable
//! 3. `<user config dir>/marquee/config.toml`
//! 4. Compiled defaults (no file at all)
//!
//! A missing or absent file is not fatal: the planner starts with compiled
//! defaults and logs a warning. API keys additionally resolve from the
//! environment before the TOML file.

use crate::geo::Coordinates;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MARQUEE_CONFIG";

/// Default HTTP port for the planner service
pub const DEFAULT_PORT: u16 = 5730;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Interface to bind the HTTP server to
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub google: GoogleConfig,

    #[serde(default)]
    pub planner: PlannerConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            openai: OpenAiConfig::default(),
            google: GoogleConfig::default(),
            planner: PlannerConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Language model (OpenAI chat completions) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (overridden by `OPENAI_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_openai_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            base_url: default_openai_base_url(),
            max_tokens: default_openai_max_tokens(),
            timeout_secs: default_openai_timeout(),
        }
    }
}

/// Google Maps Platform settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Directions API key (overridden by `GOOGLE_MAPS_API_KEY`)
    #[serde(default)]
    pub maps_api_key: Option<String>,

    /// Places API key (overridden by `GOOGLE_PLACES_API_KEY`, falls back to the maps key)
    #[serde(default)]
    pub places_api_key: Option<String>,

    #[serde(default = "default_directions_base_url")]
    pub directions_base_url: String,

    #[serde(default = "default_places_base_url")]
    pub places_base_url: String,

    #[serde(default = "default_google_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of cached directions responses
    #[serde(default = "default_directions_cache_size")]
    pub directions_cache_size: u64,

    #[serde(default = "default_directions_cache_ttl")]
    pub directions_cache_ttl_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            maps_api_key: None,
            places_api_key: None,
            directions_base_url: default_directions_base_url(),
            places_base_url: default_places_base_url(),
            timeout_secs: default_google_timeout(),
            directions_cache_size: default_directions_cache_size(),
            directions_cache_ttl_secs: default_directions_cache_ttl(),
        }
    }
}

/// Plan orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Refinement passes allowed when a request does not specify one
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Upper bound accepted from callers
    #[serde(default = "default_max_iterations_limit")]
    pub max_iterations_limit: u32,

    /// Wall-clock budget for one plan request (0 disables)
    #[serde(default = "default_time_budget")]
    pub time_budget_secs: u64,

    /// Maximum concurrent places/directions lookups in one verification pass
    #[serde(default = "default_verify_concurrency")]
    pub verify_concurrency: usize,

    /// Slack added to real travel time before comparing with the scheduled gap
    #[serde(default)]
    pub min_transfer_minutes: i64,

    #[serde(default = "default_true")]
    pub check_opening_hours: bool,

    /// City named in generation prompts when the caller gives no location
    #[serde(default = "default_city")]
    pub default_city: String,

    /// Search bias for places lookups when the caller gives no location
    #[serde(default = "default_location")]
    pub default_location: Coordinates,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_iterations_limit: default_max_iterations_limit(),
            time_budget_secs: default_time_budget(),
            verify_concurrency: default_verify_concurrency(),
            min_transfer_minutes: 0,
            check_opening_hours: true,
            default_city: default_city(),
            default_location: default_location(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_max_tokens() -> u32 {
    2000
}

fn default_openai_timeout() -> u64 {
    60
}

fn default_directions_base_url() -> String {
    "https://maps.googleapis.com/maps/api/directions/json".to_string()
}

fn default_places_base_url() -> String {
    "https://places.googleapis.com/v1".to_string()
}

fn default_google_timeout() -> u64 {
    30
}

fn default_directions_cache_size() -> u64 {
    256
}

fn default_directions_cache_ttl() -> u64 {
    900
}

fn default_max_iterations() -> u32 {
    3
}

fn default_max_iterations_limit() -> u32 {
    10
}

fn default_time_budget() -> u64 {
    120
}

fn default_verify_concurrency() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_city() -> String {
    "New York City".to_string()
}

fn default_location() -> Coordinates {
    // Times Square
    Coordinates::new(40.7580, -73.9855)
}

/// Locate the config file
///
/// Returns `None` when neither the CLI nor the environment names a file and
/// the per-user default does not exist.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config file
    dirs::config_dir()
        .map(|d| d.join("marquee").join("config.toml"))
        .filter(|p| p.exists())
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration with graceful degradation
///
/// A missing file yields compiled defaults. A file that exists but does not
/// parse is an error.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            info!("Loading configuration from {}", path.display());
            load_toml_config(&path)
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            info!("No config file found, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}

fn validate(config: &TomlConfig) -> Result<()> {
    if config.planner.max_iterations > config.planner.max_iterations_limit {
        return Err(Error::Config(format!(
            "planner.max_iterations ({}) exceeds planner.max_iterations_limit ({})",
            config.planner.max_iterations, config.planner.max_iterations_limit
        )));
    }
    if config.planner.verify_concurrency == 0 {
        return Err(Error::Config(
            "planner.verify_concurrency must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Resolve an API key from environment and TOML
///
/// **Priority:** ENV → TOML. Blank values are ignored.
pub fn resolve_api_key(label: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_key = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_value.filter(|k| is_valid_key(k)).map(str::to_string);

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} API key found in both {} and TOML config. Using environment (highest priority).",
            label, env_var
        );
    }

    if let Some(key) = env_key {
        info!("{} API key loaded from environment variable: {}", label, mask_secret(&key));
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("{} API key loaded from TOML config: {}", label, mask_secret(&key));
        return Some(key);
    }

    warn!("{} API key not configured (set {} or the TOML config)", label, env_var);
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Mask a secret for logging, keeping only the last 4 characters
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret_keeps_last_four() {
        assert_eq!(mask_secret("sk-abcdef1234"), "*********1234");
    }

    #[test]
    fn test_mask_secret_short_values_fully_masked() {
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("key"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    fn test_validate_rejects_default_above_limit() {
        let mut config = TomlConfig::default();
        config.planner.max_iterations = 20;
        assert!(matches!(validate(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = TomlConfig::default();
        config.planner.verify_concurrency = 0;
        assert!(validate(&config).is_err());
    }
}
