pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";

pub const DEVELOPER_API_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1alpha.GenerativeService/BidiGenerateContent";
pub const VERTEX_AI_PATH: &str =
    "/ws/google.cloud.aiplatform.v1beta1.LlmBidiService/BidiGenerateContent";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const API_KEY_PARAM: &str = "key";

// The setup timeout bounds all of `Session::open`, the connect timeout only the handshake.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SETUP_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 60;
