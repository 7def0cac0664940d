pub mod anthropic;
pub mod config;
pub mod retry;
pub mod sse;
pub mod summarizer;

pub mod mock;

pub use anthropic::AnthropicProvider;
pub use config::BackendConfig;
pub use mock::{MockProvider, MockResponse};
pub use retry::{RetryConfig, RetryingProvider};
pub use summarizer::LlmSummarizer;
