//! Application Configuration Module
//!
//! Loads the live-session settings from environment variables and turns them
//! into a `gemini_live::Config`.

use gemini_live::{Backend, ReleasePolicy};
use gemini_live::types::{GenerationConfig, Modality};
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::time::Duration;
use tracing::Level;

// --- Application Constants ---

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";

pub const CANDIDATE_COUNT: u32 = 1;
pub const MAX_OUTPUT_TOKENS: u32 = 2048;
pub const TEMPERATURE: f32 = 0.9;
pub const TOP_P: f32 = 1.0;
pub const TOP_K: u32 = 40;
pub const PRESENCE_PENALTY: f32 = 0.0;
pub const FREQUENCY_PENALTY: f32 = 0.0;

/// Holds all configuration loaded from the environment.
#[derive(Debug)]
pub struct Config {
    pub backend: Backend,
    /// API key for the developer API, or an access token for Vertex AI.
    pub credential: SecretString,
    pub model: String,
    pub endpoint: Option<String>,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `GOOGLE_API_KEY`: Key for the Gemini developer API. When unset, Vertex AI is used.
    // *   `GOOGLE_CLOUD_PROJECT`, `GOOGLE_CLOUD_LOCATION`: Required for Vertex AI.
    // *   `GOOGLE_ACCESS_TOKEN`: Required for Vertex AI, ex: the output of `gcloud auth print-access-token`.
    // *   `GEMINI_MODEL`: (Optional) Defaults to "gemini-2.0-flash-001".
    // *   `GEMINI_ENDPOINT`: (Optional) Full websocket URL, overriding the backend default.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::MissingVar(format!("{} must be set for Vertex AI", key)))
        };

        let (backend, credential) = match lookup("GOOGLE_API_KEY").filter(|key| !key.is_empty()) {
            Some(api_key) => (Backend::DeveloperApi, api_key),
            None => {
                let backend = Backend::VertexAi {
                    project: required("GOOGLE_CLOUD_PROJECT")?,
                    location: required("GOOGLE_CLOUD_LOCATION")?,
                };
                (backend, required("GOOGLE_ACCESS_TOKEN")?)
            }
        };

        let model = lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let endpoint = lookup("GEMINI_ENDPOINT");

        // Configure logging level from RUST_LOG, with a sensible default.
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            backend,
            credential: SecretString::from(credential),
            model,
            endpoint,
            log_level,
        })
    }

    /// Connection settings for one live session. Answers are gathered until the
    /// server marks the turn complete, so a streamed reply is printed whole.
    pub fn live_config(&self, response_timeout: Duration) -> gemini_live::ConfigBuilder {
        let builder = gemini_live::Config::builder()
            .with_backend(self.backend.clone())
            .with_api_key(self.credential.expose_secret())
            .with_model(&self.model)
            .with_response_timeout(response_timeout)
            .with_release_policy(ReleasePolicy::TurnComplete);
        match &self.endpoint {
            Some(endpoint) => builder.with_endpoint(endpoint),
            None => builder,
        }
    }
}

/// The sampling settings of the console sample, answering with `modality`.
pub fn generation_config(modality: Modality) -> GenerationConfig {
    GenerationConfig::new()
        .with_candidate_count(CANDIDATE_COUNT)
        .with_max_output_tokens(MAX_OUTPUT_TOKENS)
        .with_temperature(TEMPERATURE)
        .with_top_p(TOP_P)
        .with_top_k(TOP_K)
        .with_presence_penalty(PRESENCE_PENALTY)
        .with_frequency_penalty(FREQUENCY_PENALTY)
        .with_response_modalities(vec![modality])
}
