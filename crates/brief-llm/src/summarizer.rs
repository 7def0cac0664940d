use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, warn};

use brief_core::capability::{SummarizationCapability, SummaryOutcome};
use brief_core::errors::GatewayError;
use brief_core::language::Language;
use brief_core::options::SummaryOptions;
use brief_core::prompt::{build_prompt, SYSTEM_PROMPT};
use brief_core::provider::{LlmProvider, PromptRequest, StreamOptions};
use brief_core::stream::StreamEvent;
use brief_core::taxonomy::{classify, ClassifiedError, ErrorCode};

use crate::anthropic::AnthropicProvider;
use crate::config::BackendConfig;
use crate::retry::{RetryConfig, RetryingProvider};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// [`SummarizationCapability`] backed by a streaming text-completion
/// provider. Holds no per-call state, so one instance serves a whole batch.
pub struct LlmSummarizer {
    provider: Arc<dyn LlmProvider>,
    options: StreamOptions,
    request_timeout: Duration,
}

impl LlmSummarizer {
    pub fn new(provider: Arc<dyn LlmProvider>, options: StreamOptions) -> Self {
        Self {
            provider,
            options,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the production summarizer. A missing credential is rejected
    /// here, before any file is processed.
    pub fn from_config(config: &BackendConfig) -> Result<Self, ClassifiedError> {
        let api_key = match &config.api_key {
            Some(key) if !key.is_blank() => key.clone(),
            _ => {
                return Err(ClassifiedError::new(
                    ErrorCode::ApiKeyError,
                    "API key is not configured",
                ))
            }
        };

        let provider = AnthropicProvider::new(api_key, config).map_err(classify)?;
        let provider: Arc<dyn LlmProvider> = if config.max_retries > 0 {
            let retry = RetryConfig {
                max_retries: config.max_retries,
                ..RetryConfig::default()
            };
            Arc::new(RetryingProvider::new(Arc::new(provider), retry))
        } else {
            Arc::new(provider)
        };

        let options = StreamOptions {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        };
        Ok(Self::new(provider, options).with_request_timeout(config.request_timeout))
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Drive one completion to the end and return its normalized text.
    async fn generate(&self, request: &PromptRequest) -> Result<String, GatewayError> {
        let mut stream = self.provider.stream(request, &self.options).await?;
        let mut collected = String::new();
        let mut final_text = None;

        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::Start => {}
                StreamEvent::TextDelta { delta } => collected.push_str(&delta),
                StreamEvent::Done { text } => {
                    final_text = Some(text);
                    break;
                }
                StreamEvent::Error { error } => return Err(error),
            }
        }

        let Some(final_text) = final_text else {
            return Err(GatewayError::StreamInterrupted(
                "stream ended before completion".into(),
            ));
        };
        let raw = if collected.is_empty() {
            final_text
        } else {
            collected
        };

        let text = normalize(&raw);
        if text.is_empty() {
            return Err(GatewayError::EmptyCompletion);
        }
        Ok(text)
    }
}

#[async_trait]
impl SummarizationCapability for LlmSummarizer {
    async fn summarize(
        &self,
        source: &str,
        language: Language,
        options: &SummaryOptions,
    ) -> SummaryOutcome {
        let request = PromptRequest::new(build_prompt(source, language, options))
            .with_system(SYSTEM_PROMPT);

        let result = match tokio::time::timeout(self.request_timeout, self.generate(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.request_timeout)),
        };

        match result {
            Ok(text) => {
                debug!(language = %language, chars = text.len(), "summary generated");
                SummaryOutcome::Summarized(text)
            }
            Err(e) => {
                let classified = classify(&e);
                warn!(
                    code = %classified.code,
                    kind = e.error_kind(),
                    language = %language,
                    error = %e,
                    "summarization failed"
                );
                SummaryOutcome::Contained(classified)
            }
        }
    }
}

/// Collapse all whitespace runs so a summary fits on one report line.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
