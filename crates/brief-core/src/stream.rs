use crate::errors::GatewayError;

/// Events emitted by a streaming backend call. Ordering contract:
///
/// Start → TextDelta* → Done
///
/// Error may appear at any point and ends the stream.
#[derive(Clone, Debug)]
pub enum StreamEvent {
    Start,
    TextDelta { delta: String },
    Done { text: String },
    Error { error: GatewayError },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_classification() {
        assert!(StreamEvent::Done { text: "hi".into() }.is_terminal());
        assert!(StreamEvent::Error {
            error: GatewayError::EmptyCompletion
        }
        .is_terminal());
        assert!(!StreamEvent::Start.is_terminal());
        assert!(!StreamEvent::TextDelta { delta: "h".into() }.is_terminal());
    }
}
