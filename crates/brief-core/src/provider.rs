use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::errors::GatewayError;
use crate::stream::StreamEvent;

/// A single-turn completion request.
#[derive(Clone, Debug, Default)]
pub struct PromptRequest {
    pub system: Option<String>,
    pub prompt: String,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Options controlling generation.
#[derive(Clone, Debug)]
pub struct StreamOptions {
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: None,
        }
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// A text-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;

    async fn stream(
        &self,
        request: &PromptRequest,
        options: &StreamOptions,
    ) -> Result<EventStream, GatewayError>;
}
