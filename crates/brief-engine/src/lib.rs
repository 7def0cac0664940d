//! The summarization pipeline: discovery, per-file summarization with size
//! guards and failure containment, bounded batch scheduling, and the report.

pub mod discover;
pub mod error;
pub mod file;
pub mod filter;
pub mod pipeline;
pub mod report;
pub mod scheduler;

pub use discover::{Discoverer, DiscoveryStats};
pub use error::EngineError;
pub use file::{FileSummarizer, DEFAULT_MAX_FILE_BYTES};
pub use filter::{PathFilter, SKIP_DIRS};
pub use pipeline::{Pipeline, RunConfig, RunReport};
pub use scheduler::{BatchScheduler, DEFAULT_BATCH_SIZE};
