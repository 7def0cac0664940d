use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use brief_core::capability::SummarizationCapability;
use brief_core::options::SummaryOptions;
use brief_core::records::{FileSummary, SummaryStatus};
use serde::Serialize;
use tracing::{info, instrument};

use crate::discover::{Discoverer, DiscoveryStats};
use crate::error::EngineError;
use crate::file::{FileSummarizer, DEFAULT_MAX_FILE_BYTES};
use crate::filter::PathFilter;
use crate::report;
use crate::scheduler::{BatchScheduler, DEFAULT_BATCH_SIZE};

/// Inputs for one run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub root: PathBuf,
    pub output: PathBuf,
    pub batch_size: usize,
    pub max_file_bytes: u64,
    pub options: SummaryOptions,
    /// Name of the ignore file looked up at `root`.
    pub ignore_file: String,
}

impl RunConfig {
    pub fn new(root: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output: output.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            options: SummaryOptions::default(),
            ignore_file: ".gitignore".to_string(),
        }
    }
}

/// Tally of a finished run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub discovered: usize,
    pub summarized: usize,
    pub too_large: usize,
    pub failed: usize,
    pub output: PathBuf,
    #[serde(skip)]
    pub discovery: DiscoveryStats,
}

impl RunReport {
    fn tally(summaries: &[FileSummary], output: PathBuf, discovery: DiscoveryStats) -> Self {
        let mut report = Self {
            discovered: summaries.len(),
            output,
            discovery,
            ..Self::default()
        };
        for summary in summaries {
            match summary.status {
                SummaryStatus::Summarized => report.summarized += 1,
                SummaryStatus::TooLarge => report.too_large += 1,
                SummaryStatus::CapabilityFailed | SummaryStatus::Unreadable(_) => {
                    report.failed += 1
                }
            }
        }
        report
    }
}

/// Discover, summarize in batches, then write the report once.
pub struct Pipeline {
    capability: Arc<dyn SummarizationCapability>,
}

impl Pipeline {
    pub fn new(capability: Arc<dyn SummarizationCapability>) -> Self {
        Self { capability }
    }

    #[instrument(skip_all, fields(root = %config.root.display()))]
    pub async fn run(&self, config: &RunConfig) -> Result<RunReport, EngineError> {
        let started = Instant::now();

        let summarizer = FileSummarizer::new(self.capability.clone())
            .with_max_bytes(config.max_file_bytes)
            .with_options(config.options.clone());
        let scheduler = BatchScheduler::new(summarizer, config.batch_size)?;

        let filter = PathFilter::load(&config.root, &config.ignore_file);
        let (records, discovery) = Discoverer::new(filter)
            .discover_with_stats(&config.root)
            .await?;
        info!(files = records.len(), batch_size = config.batch_size, "discovered files");

        let summaries = scheduler.summarize_many(&records).await;
        report::write(&summaries, &config.output).await?;

        let run = RunReport::tally(&summaries, config.output.clone(), discovery);
        info!(
            discovered = run.discovered,
            summarized = run.summarized,
            too_large = run.too_large,
            failed = run.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run complete"
        );
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use brief_core::capability::SummaryOutcome;
    use brief_core::language::Language;
    use tempfile::TempDir;

    struct Fixed;

    #[async_trait]
    impl SummarizationCapability for Fixed {
        async fn summarize(&self, _: &str, language: Language, _: &SummaryOptions) -> SummaryOutcome {
            SummaryOutcome::Summarized(format!("A {language} file."))
        }
    }

    #[tokio::test]
    async fn zero_batch_size_fails_before_discovery() {
        let dir = TempDir::new().unwrap();
        let config = RunConfig {
            batch_size: 0,
            ..RunConfig::new(dir.path().join("missing"), dir.path().join("out.txt"))
        };
        let err = Pipeline::new(Arc::new(Fixed)).run(&config).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidBatchSize));
    }

    #[tokio::test]
    async fn missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let config = RunConfig::new(dir.path().join("missing"), dir.path().join("out.txt"));
        let err = Pipeline::new(Arc::new(Fixed)).run(&config).await.unwrap_err();
        assert!(matches!(err, EngineError::ScanRoot { .. }));
        assert!(!dir.path().join("out.txt").exists());
    }

    #[tokio::test]
    async fn tallies_outcomes() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::write(src.path().join("a.rs"), "fn a() {}").unwrap();
        std::fs::write(src.path().join("b.rs"), vec![b'x'; 64]).unwrap();

        let config = RunConfig {
            max_file_bytes: 32,
            ..RunConfig::new(src.path(), out.path().join("out.txt"))
        };
        let run = Pipeline::new(Arc::new(Fixed)).run(&config).await.unwrap();
        assert_eq!(run.discovered, 2);
        assert_eq!(run.summarized, 1);
        assert_eq!(run.too_large, 1);
        assert_eq!(run.failed, 0);
        assert_eq!(run.discovery.dirs_listed, 1);
    }
}
