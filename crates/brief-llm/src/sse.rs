use serde::Deserialize;
use serde_json::Value;

use brief_core::errors::GatewayError;
use brief_core::stream::StreamEvent;

/// State machine turning Anthropic SSE events into [`StreamEvent`]s.
/// Only text blocks are tracked; other block types are skipped.
#[derive(Debug, Default)]
pub struct SseParser {
    text: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one SSE event and return zero or more StreamEvents.
    pub fn parse_event(&mut self, event_type: &str, data: &str) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        match event_type {
            "message_start" => events.push(StreamEvent::Start),

            "content_block_delta" => match serde_json::from_str::<ContentBlockDeltaEvent>(data) {
                Ok(delta) => {
                    if delta.delta.get("type").and_then(|t| t.as_str()) == Some("text_delta") {
                        let text = delta
                            .delta
                            .get("text")
                            .and_then(|t| t.as_str())
                            .unwrap_or("");
                        self.text.push_str(text);
                        events.push(StreamEvent::TextDelta {
                            delta: text.to_string(),
                        });
                    }
                }
                Err(e) => events.push(StreamEvent::Error {
                    error: GatewayError::MalformedResponse(format!("content_block_delta: {e}")),
                }),
            },

            "message_stop" => {
                events.push(StreamEvent::Done {
                    text: self.text.clone(),
                });
            }

            "error" => {
                let error = match serde_json::from_str::<ErrorEvent>(data) {
                    Ok(err) => classify_error(&err.error),
                    Err(_) => GatewayError::MalformedResponse(truncate(data, 200)),
                };
                events.push(StreamEvent::Error { error });
            }

            _ => {} // ping, message_delta, content_block_start/stop
        }

        events
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

fn classify_error(payload: &ErrorPayload) -> GatewayError {
    match payload.error_type.as_str() {
        "authentication_error" | "permission_error" => {
            GatewayError::AuthenticationFailed(payload.message.clone())
        }
        "invalid_request_error" | "not_found_error" => {
            GatewayError::InvalidRequest(payload.message.clone())
        }
        "request_too_large" => GatewayError::PayloadTooLarge(payload.message.clone()),
        "rate_limit_error" => GatewayError::RateLimited { retry_after: None },
        "overloaded_error" => GatewayError::ProviderOverloaded,
        "api_error" => GatewayError::ServerError {
            status: 500,
            body: payload.message.clone(),
        },
        other => GatewayError::StreamInterrupted(format!("{other}: {}", payload.message)),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Split a raw SSE chunk into (event, data) pairs.
pub fn parse_sse_lines(raw: &str) -> Vec<(String, String)> {
    let mut events = Vec::new();
    let mut current_event = String::new();
    let mut current_data = String::new();

    for line in raw.lines() {
        if let Some(event) = line.strip_prefix("event:") {
            current_event = event.trim().to_string();
        } else if let Some(data) = line.strip_prefix("data:") {
            if !current_data.is_empty() {
                current_data.push('\n');
            }
            current_data.push_str(data.trim_start());
        } else if line.is_empty() && !current_event.is_empty() {
            events.push((std::mem::take(&mut current_event), std::mem::take(&mut current_data)));
        }
    }

    // Trailing event without blank line
    if !current_event.is_empty() {
        events.push((current_event, current_data));
    }

    events
}

// --- Deserialization types for Anthropic SSE events ---

#[derive(Deserialize)]
struct ContentBlockDeltaEvent {
    delta: Value,
}

#[derive(Deserialize)]
struct ErrorEvent {
    error: ErrorPayload,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_text_stream() {
        let mut parser = SseParser::new();

        let events = parser.parse_event(
            "message_start",
            r#"{"type":"message_start","message":{"id":"msg_1","usage":{"input_tokens":120,"output_tokens":0}}}"#,
        );
        assert!(matches!(&events[..], [StreamEvent::Start]));

        let events = parser.parse_event(
            "content_block_start",
            r#"{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#,
        );
        assert!(events.is_empty());

        for chunk in ["Parses ", "config files."] {
            let data = format!(
                r#"{{"type":"content_block_delta","index":0,"delta":{{"type":"text_delta","text":"{chunk}"}}}}"#
            );
            let events = parser.parse_event("content_block_delta", &data);
            assert_eq!(events.len(), 1);
        }

        let events = parser.parse_event(
            "message_delta",
            r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":9}}"#,
        );
        assert!(events.is_empty());

        let events = parser.parse_event("message_stop", r#"{"type":"message_stop"}"#);
        match &events[..] {
            [StreamEvent::Done { text }] => assert_eq!(text, "Parses config files."),
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[test]
    fn non_text_deltas_are_skipped() {
        let mut parser = SseParser::new();
        let events = parser.parse_event(
            "content_block_delta",
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"thinking_delta","thinking":"hmm"}}"#,
        );
        assert!(events.is_empty());
        assert_eq!(parser.text(), "");
    }

    #[test]
    fn malformed_delta_is_an_error_event() {
        let mut parser = SseParser::new();
        let events = parser.parse_event("content_block_delta", "{oops");
        assert!(matches!(
            &events[..],
            [StreamEvent::Error {
                error: GatewayError::MalformedResponse(_)
            }]
        ));
    }

    #[test]
    fn error_events_are_classified() {
        let mut parser = SseParser::new();
        let events = parser.parse_event(
            "error",
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        );
        assert!(matches!(
            &events[..],
            [StreamEvent::Error {
                error: GatewayError::ProviderOverloaded
            }]
        ));

        let events = parser.parse_event(
            "error",
            r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
        );
        assert!(matches!(
            &events[..],
            [StreamEvent::Error {
                error: GatewayError::AuthenticationFailed(_)
            }]
        ));
    }

    #[test]
    fn parse_sse_lines_basic() {
        let raw = "event: message_start\ndata: {\"a\":1}\n\nevent: ping\ndata: {}\n\n";
        let events = parse_sse_lines(raw);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ("message_start".to_string(), "{\"a\":1}".to_string()));
        assert_eq!(events[1].0, "ping");
    }

    #[test]
    fn parse_sse_lines_trailing_event() {
        let events = parse_sse_lines("event: message_stop\ndata: {}");
        assert_eq!(events, vec![("message_stop".to_string(), "{}".to_string())]);
    }
}
