use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::{Future, Stream};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::instrument;

use brief_core::errors::GatewayError;
use brief_core::provider::{EventStream, LlmProvider, PromptRequest, StreamOptions};
use brief_core::security::ApiKey;
use brief_core::stream::StreamEvent;

use crate::config::BackendConfig;
use crate::sse::{self, SseParser};

const API_VERSION: &str = "2023-06-01";

/// Streaming client for the Anthropic Messages API.
pub struct AnthropicProvider {
    client: Client,
    api_key: ApiKey,
    model: String,
    url: String,
    idle_timeout: Duration,
}

impl AnthropicProvider {
    pub fn new(api_key: ApiKey, config: &BackendConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| GatewayError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            url: config.messages_url(),
            idle_timeout: config.idle_timeout,
        })
    }

    fn build_request(&self, request: &PromptRequest, options: &StreamOptions) -> reqwest::RequestBuilder {
        let body = build_request_body(request, options, &self.model);

        self.client
            .post(&self.url)
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", API_VERSION)
            .header("accept", "text/event-stream")
            .header("content-type", "application/json")
            .json(&body)
    }
}

/// Request body for a single user turn with streaming enabled.
pub fn build_request_body(request: &PromptRequest, options: &StreamOptions, model: &str) -> Value {
    let mut body = json!({
        "model": model,
        "stream": true,
        "max_tokens": options.max_tokens,
        "messages": [
            {"role": "user", "content": request.prompt},
        ],
    });

    if let Some(system) = &request.system {
        body["system"] = json!(system);
    }
    if let Some(temp) = options.temperature {
        body["temperature"] = json!(temp);
    }

    body
}

fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request, options), fields(model = %self.model))]
    async fn stream(
        &self,
        request: &PromptRequest,
        options: &StreamOptions,
    ) -> Result<EventStream, GatewayError> {
        let resp = self
            .build_request(request, options)
            .send()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let suggested = retry_after(resp.headers());
            let body = resp.text().await.unwrap_or_default();
            return Err(match GatewayError::from_status(status, body) {
                GatewayError::RateLimited { .. } => GatewayError::RateLimited {
                    retry_after: suggested,
                },
                other => other,
            });
        }

        Ok(Box::pin(SseStream::new(resp.bytes_stream(), self.idle_timeout)))
    }
}

/// Wraps a byte stream from reqwest and yields StreamEvents.
/// If no data arrives within `idle_duration`, emits an error.
struct SseStream {
    inner: Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>,
    parser: SseParser,
    buffer: Vec<u8>,
    pending: VecDeque<StreamEvent>,
    idle_deadline: Pin<Box<tokio::time::Sleep>>,
    idle_duration: Duration,
    finished: bool,
}

impl SseStream {
    fn new(
        byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            parser: SseParser::new(),
            buffer: Vec::new(),
            pending: VecDeque::new(),
            idle_deadline: Box::pin(tokio::time::sleep(idle_timeout)),
            idle_duration: idle_timeout,
            finished: false,
        }
    }

    /// Carriage returns are dropped so CRLF framing splits like LF.
    fn push_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
    }

    /// Decode only complete events, so a multi-byte character split across
    /// network chunks is reassembled before it becomes text.
    fn drain_buffer(&mut self, flush: bool) {
        while let Some(pos) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let raw: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            self.feed(&String::from_utf8_lossy(&raw));
        }
        if flush && !self.buffer.is_empty() {
            let remaining = std::mem::take(&mut self.buffer);
            self.feed(&String::from_utf8_lossy(&remaining));
        }
    }

    fn feed(&mut self, chunk: &str) {
        for (event_type, data) in sse::parse_sse_lines(chunk) {
            let events = self.parser.parse_event(&event_type, &data);
            self.pending.extend(events);
        }
    }

    fn next_pending(&mut self) -> Option<StreamEvent> {
        let event = self.pending.pop_front()?;
        if event.is_terminal() {
            self.finished = true;
            self.pending.clear();
        }
        Some(event)
    }
}

impl Stream for SseStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(event) = self.next_pending() {
            return Poll::Ready(Some(event));
        }
        if self.finished {
            return Poll::Ready(None);
        }

        loop {
            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    let deadline = tokio::time::Instant::now() + self.idle_duration;
                    self.idle_deadline.as_mut().reset(deadline);

                    self.push_bytes(&bytes);
                    self.drain_buffer(false);

                    if let Some(event) = self.next_pending() {
                        return Poll::Ready(Some(event));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    self.finished = true;
                    return Poll::Ready(Some(StreamEvent::Error {
                        error: GatewayError::StreamInterrupted(e.to_string()),
                    }));
                }
                Poll::Ready(None) => {
                    self.drain_buffer(true);
                    if let Some(event) = self.next_pending() {
                        return Poll::Ready(Some(event));
                    }
                    self.finished = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => {
                    if self.idle_deadline.as_mut().poll(cx).is_ready() {
                        self.finished = true;
                        return Poll::Ready(Some(StreamEvent::Error {
                            error: GatewayError::StreamInterrupted(format!(
                                "idle timeout after {}s",
                                self.idle_duration.as_secs()
                            )),
                        }));
                    }
                    return Poll::Pending;
                }
            }
        }
    }
}
