//! Shared types for the filebrief workspace: the records that flow through
//! the pipeline, the summarization and backend contracts, and the error
//! taxonomy every component classifies failures with.

pub mod capability;
pub mod errors;
pub mod language;
pub mod options;
pub mod prompt;
pub mod provider;
pub mod records;
pub mod security;
pub mod stream;
pub mod taxonomy;

pub use capability::{SummarizationCapability, SummaryOutcome, FAILED_SUMMARY};
pub use errors::GatewayError;
pub use language::Language;
pub use options::{DetailLevel, SummaryOptions};
pub use records::{FileRecord, FileSummary, SummaryStatus, TOO_LARGE_SUMMARY};
pub use taxonomy::{classify, report, Classify, ClassifiedError, ErrorCode, ErrorReport};
