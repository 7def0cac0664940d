use std::io;
use std::path::PathBuf;

use brief_core::taxonomy::{Classify, ClassifiedError, ErrorCode};

/// Structural failures that stop a run. Per-file problems never surface here.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid config: batch size must be at least 1")]
    InvalidBatchSize,

    #[error("cannot read scan root {}: {source}", path.display())]
    ScanRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write report {}: {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Classify for &EngineError {
    fn classify(self) -> ClassifiedError {
        match self {
            EngineError::InvalidBatchSize => {
                ClassifiedError::new(ErrorCode::ConfigError, self.to_string())
                    .with_context("setting", "batchSize")
            }
            EngineError::ScanRoot { path, source } | EngineError::ReportWrite { path, source } => {
                ClassifiedError::new(ErrorCode::FileSystemError, self.to_string())
                    .with_context("path", path.display().to_string())
                    .with_context("kind", format!("{:?}", source.kind()))
            }
        }
    }
}

impl Classify for EngineError {
    fn classify(self) -> ClassifiedError {
        (&self).classify()
    }
}
