use crate::client::consts::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MODEL, DEFAULT_RESPONSE_TIMEOUT_SECS,
    DEFAULT_SETUP_TIMEOUT_SECS, DEVELOPER_API_URL, GOOGLE_API_KEY, VERTEX_AI_PATH,
};
use crate::response::ReleasePolicy;
use secrecy::SecretString;
use std::time::Duration;

/// Which flavour of the live API the session talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// API-key authenticated developer endpoint.
    DeveloperApi,
    /// Regional Vertex AI endpoint, authenticated with a bearer token.
    VertexAi { project: String, location: String },
}

pub struct Config {
    endpoint: Option<String>,
    backend: Backend,
    api_key: SecretString,
    model: String,
    voice_name: Option<String>,
    connect_timeout: Duration,
    setup_timeout: Duration,
    response_timeout: Duration,
    release_policy: ReleasePolicy,
}

pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    /// Overrides the websocket URL derived from the backend.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.config.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// API key for the developer endpoint, or an access token for Vertex AI.
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.config.api_key = SecretString::from(api_key.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.config.model = model.to_string();
        self
    }

    pub fn with_voice_name(mut self, voice_name: &str) -> Self {
        self.config.voice_name = Some(voice_name.to_string());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Bound on all of `Session::open`: handshake, setup message and its acknowledgment.
    pub fn with_setup_timeout(mut self, timeout: Duration) -> Self {
        self.config.setup_timeout = timeout;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = timeout;
        self
    }

    pub fn with_release_policy(mut self, release_policy: ReleasePolicy) -> Self {
        self.config.release_policy = release_policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    // Sets the default values.
    pub fn new() -> Self {
        Self {
            endpoint: None,
            backend: Backend::DeveloperApi,
            api_key: std::env::var(GOOGLE_API_KEY)
                .unwrap_or_else(|_| "".to_string())
                .into(),
            model: DEFAULT_MODEL.to_string(),
            voice_name: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            setup_timeout: Duration::from_secs(DEFAULT_SETUP_TIMEOUT_SECS),
            response_timeout: Duration::from_secs(DEFAULT_RESPONSE_TIMEOUT_SECS),
            release_policy: ReleasePolicy::default(),
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// The websocket URL to dial, without credentials.
    pub fn endpoint(&self) -> String {
        if let Some(endpoint) = &self.endpoint {
            return endpoint.clone();
        }
        match &self.backend {
            Backend::DeveloperApi => DEVELOPER_API_URL.to_string(),
            Backend::VertexAi { location, .. } => {
                format!("wss://{}-aiplatform.googleapis.com{}", location, VERTEX_AI_PATH)
            }
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The model name as the backend expects it in the setup message.
    pub fn model_resource(&self) -> String {
        match &self.backend {
            Backend::DeveloperApi => self.model.clone(),
            Backend::VertexAi { project, location } => format!(
                "projects/{}/locations/{}/publishers/google/models/{}",
                project, location, self.model
            ),
        }
    }

    pub fn voice_name(&self) -> Option<&str> {
        self.voice_name.as_deref()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn setup_timeout(&self) -> Duration {
        self.setup_timeout
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    pub fn release_policy(&self) -> ReleasePolicy {
        self.release_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex() -> Backend {
        Backend::VertexAi {
            project: "my-project".to_string(),
            location: "europe-west4".to_string(),
        }
    }

    #[test]
    fn test_developer_api_defaults() {
        let config = Config::builder().with_api_key("k").build();

        assert_eq!(config.endpoint(), DEVELOPER_API_URL);
        assert_eq!(config.model_resource(), DEFAULT_MODEL);
        assert_eq!(config.setup_timeout(), Duration::from_secs(60));
        assert_eq!(config.response_timeout(), Duration::from_secs(60));
        assert_eq!(config.release_policy(), ReleasePolicy::FirstFragment);
    }

    #[test]
    fn test_vertex_endpoint_and_model_path() {
        let config = Config::builder()
            .with_backend(vertex())
            .with_model("gemini-2.0-flash-001")
            .build();

        assert_eq!(
            config.endpoint(),
            "wss://europe-west4-aiplatform.googleapis.com/ws/google.cloud.aiplatform.v1beta1.LlmBidiService/BidiGenerateContent"
        );
        assert_eq!(
            config.model_resource(),
            "projects/my-project/locations/europe-west4/publishers/google/models/gemini-2.0-flash-001"
        );
    }

    #[test]
    fn test_endpoint_override_wins() {
        let config = Config::builder()
            .with_backend(vertex())
            .with_endpoint("ws://127.0.0.1:9000")
            .build();

        assert_eq!(config.endpoint(), "ws://127.0.0.1:9000");
    }
}
