use std::time::Duration;

use brief_core::security::ApiKey;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Everything needed to build the production summarizer. Passed in
/// explicitly; the backend never reads the environment itself.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub api_key: Option<ApiKey>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub max_retries: u32,
    pub connect_timeout: Duration,
    /// Maximum silence between SSE chunks.
    pub idle_timeout: Duration,
    /// Upper bound on one whole summarization call.
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: 1024,
            temperature: Some(0.2),
            max_retries: 2,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(90),
            request_timeout: Duration::from_secs(180),
        }
    }
}

impl BackendConfig {
    pub fn with_api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Full Messages API endpoint.
    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}
