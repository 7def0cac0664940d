use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;

use brief_core::errors::GatewayError;
use brief_core::provider::{EventStream, LlmProvider, PromptRequest, StreamOptions};
use brief_core::stream::StreamEvent;

/// Pre-programmed responses for deterministic testing without API calls.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Yield a sequence of StreamEvents.
    Stream(Vec<StreamEvent>),
    /// Return an error from the stream() call itself.
    Error(GatewayError),
    /// Wait a duration, then yield the inner response.
    Delay(Duration, Box<MockResponse>),
}

impl MockResponse {
    /// A well-formed text completion.
    pub fn text(text: &str) -> Self {
        Self::Stream(vec![
            StreamEvent::Start,
            StreamEvent::TextDelta {
                delta: text.to_string(),
            },
            StreamEvent::Done {
                text: text.to_string(),
            },
        ])
    }

    /// A stream that starts and then fails.
    pub fn stream_error(error: GatewayError) -> Self {
        Self::Stream(vec![StreamEvent::Start, StreamEvent::Error { error }])
    }

    pub fn delayed(delay: Duration, inner: MockResponse) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

/// Mock backend returning scripted responses in call order.
///
/// With [`MockProvider::repeating`] every call gets the same response,
/// which suits concurrent callers whose order is not fixed.
pub struct MockProvider {
    responses: Vec<MockResponse>,
    repeat: bool,
    call_count: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses,
            repeat: false,
            call_count: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(response: MockResponse) -> Self {
        Self {
            repeat: true,
            ..Self::new(vec![response])
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Prompts received so far, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn stream(
        &self,
        request: &PromptRequest,
        _options: &StreamOptions,
    ) -> Result<EventStream, GatewayError> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);
        self.prompts.lock().push(request.prompt.clone());

        let response = if self.repeat {
            self.responses.first()
        } else {
            self.responses.get(idx)
        };

        match response {
            Some(response) => resolve_response(response.clone()).await,
            None => Err(GatewayError::InvalidRequest(format!(
                "MockProvider: no response configured for call {idx}"
            ))),
        }
    }
}

/// Unrolls nested delays iteratively to avoid recursive async.
async fn resolve_response(mut current: MockResponse) -> Result<EventStream, GatewayError> {
    loop {
        match current {
            MockResponse::Stream(events) => return Ok(Box::pin(stream::iter(events))),
            MockResponse::Error(e) => return Err(e),
            MockResponse::Delay(duration, inner) => {
                tokio::time::sleep(duration).await;
                current = *inner;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn text_response() {
        let mock = MockProvider::new(vec![MockResponse::text("hello world")]);
        let stream = mock
            .stream(&PromptRequest::new("p"), &StreamOptions::default())
            .await
            .unwrap();
        let events: Vec<StreamEvent> = stream.collect().await;

        assert_eq!(events.len(), 3);
        assert!(matches!(&events[1], StreamEvent::TextDelta { delta } if delta == "hello world"));
        assert!(matches!(events[2], StreamEvent::Done { .. }));
    }

    #[tokio::test]
    async fn error_response() {
        let mock = MockProvider::new(vec![MockResponse::Error(
            GatewayError::AuthenticationFailed("bad".into()),
        )]);
        let result = mock.stream(&PromptRequest::new("p"), &StreamOptions::default()).await;
        assert!(matches!(result, Err(GatewayError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn exhausted_responses() {
        let mock = MockProvider::new(vec![MockResponse::text("only one")]);
        let opts = StreamOptions::default();
        assert!(mock.stream(&PromptRequest::new("a"), &opts).await.is_ok());
        assert!(mock.stream(&PromptRequest::new("b"), &opts).await.is_err());
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.prompts(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn repeating_never_exhausts() {
        let mock = MockProvider::repeating(MockResponse::text("same"));
        let opts = StreamOptions::default();
        for _ in 0..4 {
            assert!(mock.stream(&PromptRequest::new("x"), &opts).await.is_ok());
        }
        assert_eq!(mock.call_count(), 4);
    }

    #[tokio::test]
    async fn delayed_response() {
        tokio::time::pause();
        let mock = MockProvider::new(vec![MockResponse::delayed(
            Duration::from_millis(50),
            MockResponse::text("after delay"),
        )]);

        let start = tokio::time::Instant::now();
        let stream = mock
            .stream(&PromptRequest::new("p"), &StreamOptions::default())
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));

        let events: Vec<StreamEvent> = stream.collect().await;
        assert_eq!(events.len(), 3);
    }
}
