use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use brief_core::errors::GatewayError;
use brief_core::provider::{EventStream, LlmProvider, PromptRequest, StreamOptions};
use brief_core::taxonomy::{classify, ClassifiedError};

/// Retry behaviour for transient backend failures.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Wraps an LlmProvider with capped exponential backoff.
///
/// - Only errors returned before the stream opens are retried
/// - Fatal errors are returned immediately
/// - `retry_after` hints from rate limit responses take precedence
pub struct RetryingProvider {
    inner: Arc<dyn LlmProvider>,
    config: RetryConfig,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    fn retry_delay(&self, attempt: u32, suggested: Option<Duration>) -> Duration {
        if let Some(delay) = suggested {
            return delay.min(self.config.max_delay);
        }
        let factor = 2u32.saturating_pow(attempt);
        self.config
            .base_delay
            .saturating_mul(factor)
            .min(self.config.max_delay)
    }
}

/// Classified form of a failed attempt, as it is logged before the next one.
fn retry_notice(error: &GatewayError, attempt: u32) -> ClassifiedError {
    classify(error).with_context("attempt", attempt.to_string())
}

#[async_trait]
impl LlmProvider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn stream(
        &self,
        request: &PromptRequest,
        options: &StreamOptions,
    ) -> Result<EventStream, GatewayError> {
        let mut attempt = 0;
        loop {
            match self.inner.stream(request, options).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    if e.is_fatal() || !e.is_retryable() || attempt >= self.config.max_retries {
                        return Err(e);
                    }

                    let delay = self.retry_delay(attempt, e.suggested_delay());
                    attempt += 1;

                    let notice = retry_notice(&e, attempt);
                    warn!(
                        code = %notice.code,
                        kind = notice.context_value("kind").unwrap_or_default(),
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after backend error: {}",
                        notice.message
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockProvider, MockResponse};
    use brief_core::taxonomy::ErrorCode;

    fn server_error() -> MockResponse {
        MockResponse::Error(GatewayError::ServerError {
            status: 500,
            body: "internal".into(),
        })
    }

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn retrying(mock: &Arc<MockProvider>, config: RetryConfig) -> RetryingProvider {
        RetryingProvider::new(mock.clone(), config)
    }

    #[tokio::test]
    async fn success_on_first_try() {
        let mock = Arc::new(MockProvider::new(vec![MockResponse::text("hi")]));
        let result = retrying(&mock, RetryConfig::default())
            .stream(&PromptRequest::new("p"), &StreamOptions::default())
            .await;
        assert!(result.is_ok());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn retries_on_retryable_error() {
        let mock = Arc::new(MockProvider::new(vec![
            server_error(),
            server_error(),
            MockResponse::text("recovered"),
        ]));

        let result = retrying(&mock, fast())
            .stream(&PromptRequest::new("p"), &StreamOptions::default())
            .await;
        assert!(result.is_ok());
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn fatal_error_not_retried() {
        let mock = Arc::new(MockProvider::new(vec![
            MockResponse::Error(GatewayError::AuthenticationFailed("bad key".into())),
            MockResponse::text("should not reach"),
        ]));

        let err = retrying(&mock, fast())
            .stream(&PromptRequest::new("p"), &StreamOptions::default())
            .await
            .err()
            .expect("expected error");
        assert!(matches!(err, GatewayError::AuthenticationFailed(_)));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn max_retries_exhausted() {
        let mock = Arc::new(MockProvider::repeating(server_error()));

        let result = retrying(&mock, fast())
            .stream(&PromptRequest::new("p"), &StreamOptions::default())
            .await;
        assert!(matches!(result, Err(GatewayError::ServerError { .. })));
        assert_eq!(mock.call_count(), 4);
    }

    #[tokio::test]
    async fn zero_retries_is_single_attempt() {
        let mock = Arc::new(MockProvider::repeating(server_error()));
        let config = RetryConfig {
            max_retries: 0,
            ..fast()
        };
        let _ = retrying(&mock, config)
            .stream(&PromptRequest::new("p"), &StreamOptions::default())
            .await;
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn retried_failures_are_classified() {
        let notice = retry_notice(
            &GatewayError::ServerError {
                status: 503,
                body: "unavailable".into(),
            },
            2,
        );
        assert_eq!(notice.code, ErrorCode::LlmError);
        assert!(notice.is_retryable);
        assert_eq!(notice.context_value("attempt"), Some("2"));
        assert_eq!(notice.context_value("kind"), Some("server_error"));

        let notice = retry_notice(&GatewayError::ProviderOverloaded, 1);
        assert_eq!(notice.code, ErrorCode::LlmError);
    }

    #[test]
    fn retry_delay_respects_suggested() {
        let mock = Arc::new(MockProvider::new(vec![]));
        let delay = retrying(&mock, RetryConfig::default())
            .retry_delay(0, Some(Duration::from_secs(5)));
        assert_eq!(delay, Duration::from_secs(5));
    }

    #[test]
    fn retry_delay_is_capped() {
        let mock = Arc::new(MockProvider::new(vec![]));
        let retrying = retrying(&mock, RetryConfig::default());
        assert_eq!(retrying.retry_delay(0, None), Duration::from_secs(1));
        assert_eq!(retrying.retry_delay(2, None), Duration::from_secs(4));
        assert_eq!(retrying.retry_delay(10, None), Duration::from_secs(30));
        assert_eq!(
            retrying.retry_delay(0, Some(Duration::from_secs(600))),
            Duration::from_secs(30)
        );
    }
}
