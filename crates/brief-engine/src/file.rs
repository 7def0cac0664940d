use std::path::Path;
use std::sync::Arc;

use brief_core::capability::{SummarizationCapability, SummaryOutcome};
use brief_core::language::Language;
use brief_core::options::SummaryOptions;
use brief_core::records::{FileRecord, FileSummary};
use brief_core::taxonomy::classify;
use tracing::{debug, warn};

use crate::discover::relative_path;

/// 500 KiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 500 * 1024;

/// Turns one file into exactly one [`FileSummary`], whatever happens.
#[derive(Clone)]
pub struct FileSummarizer {
    capability: Arc<dyn SummarizationCapability>,
    max_bytes: u64,
    options: SummaryOptions,
}

impl FileSummarizer {
    pub fn new(capability: Arc<dyn SummarizationCapability>) -> Self {
        Self {
            capability,
            max_bytes: DEFAULT_MAX_FILE_BYTES,
            options: SummaryOptions::default(),
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_options(mut self, options: SummaryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Summarize `path`, reporting it relative to `scan_root`. A path outside
    /// the root is reported as given.
    pub async fn summarize_path(&self, path: &Path, scan_root: &Path) -> FileSummary {
        let relative =
            relative_path(scan_root, path).unwrap_or_else(|| path.display().to_string());
        self.summarize_one(&FileRecord::new(path.to_path_buf(), relative))
            .await
    }

    /// Stat, size-check, read, then summarize. Oversized files are never
    /// read; stat and read failures become a descriptive summary.
    pub async fn summarize_one(&self, record: &FileRecord) -> FileSummary {
        let rel = record.relative_path.as_str();

        let size = match tokio::fs::metadata(&record.absolute_path).await {
            Ok(meta) => meta.len(),
            Err(e) => return unreadable(rel, e),
        };
        if size > self.max_bytes {
            debug!(path = rel, size, max_bytes = self.max_bytes, "file too large, skipping");
            return FileSummary::too_large(rel);
        }

        let bytes = match tokio::fs::read(&record.absolute_path).await {
            Ok(bytes) => bytes,
            Err(e) => return unreadable(rel, e),
        };
        let source = String::from_utf8_lossy(&bytes);
        let language = Language::from_path(&record.absolute_path);

        match self
            .capability
            .summarize(&source, language, &self.options)
            .await
        {
            SummaryOutcome::Summarized(text) => FileSummary::summarized(rel, text),
            SummaryOutcome::Contained(err) => {
                debug!(path = rel, code = %err.code, "summary replaced by sentinel");
                FileSummary::capability_failed(rel)
            }
        }
    }
}

fn unreadable(rel: &str, error: std::io::Error) -> FileSummary {
    let classified = classify(&error).with_context("path", rel);
    warn!(path = rel, code = %classified.code, error = %error, "could not read file");
    FileSummary::unreadable(rel, &classified)
}
