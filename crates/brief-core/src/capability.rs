use async_trait::async_trait;

use crate::language::Language;
use crate::options::SummaryOptions;
use crate::taxonomy::ClassifiedError;

pub const FAILED_SUMMARY: &str = "Failed to generate summary.";

/// Result of one summarization call. Failures are contained, never raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SummaryOutcome {
    Summarized(String),
    Contained(ClassifiedError),
}

impl SummaryOutcome {
    pub fn is_summarized(&self) -> bool {
        matches!(self, Self::Summarized(_))
    }

    pub fn error(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Contained(err) => Some(err),
            Self::Summarized(_) => None,
        }
    }

    /// The summary text, or the failure sentinel.
    pub fn into_text(self) -> String {
        match self {
            Self::Summarized(text) => text,
            Self::Contained(_) => FAILED_SUMMARY.to_string(),
        }
    }
}

/// Produces a short summary of a unit of source text.
///
/// Implementations must be safe to call concurrently and keep no mutable
/// per-call state. A single call must fully materialize its text before
/// returning.
#[async_trait]
pub trait SummarizationCapability: Send + Sync {
    async fn summarize(
        &self,
        source: &str,
        language: Language,
        options: &SummaryOptions,
    ) -> SummaryOutcome;
}
