//! Language model collaborator
//!
//! The plan generator, refiner and summarizer depend on this trait rather than
//! on a concrete client, so tests substitute scripted fakes.

use async_trait::async_trait;
use thiserror::Error;

/// Language model client errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Language model not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

/// One chat-completion style request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask the model for a JSON object response
    pub json_response: bool,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.7,
            max_tokens: None,
            json_response: false,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn json(mut self) -> Self {
        self.json_response = true;
        self
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Short name for logs and status reports
    fn name(&self) -> &str;

    /// Whether credentials are present
    fn is_configured(&self) -> bool {
        true
    }

    /// Return the model's text response
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}
