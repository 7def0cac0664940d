use std::num::NonZeroUsize;

use brief_core::records::{FileRecord, FileSummary};
use futures::future::join_all;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::file::FileSummarizer;

pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Drives files through a [`FileSummarizer`] in consecutive chunks. Files in
/// a chunk run concurrently; the next chunk starts only after every file of
/// the current one has finished, so at most `batch_size` backend calls are
/// in flight at once.
pub struct BatchScheduler {
    summarizer: FileSummarizer,
    batch_size: NonZeroUsize,
}

impl BatchScheduler {
    pub fn new(summarizer: FileSummarizer, batch_size: usize) -> Result<Self, EngineError> {
        let batch_size = NonZeroUsize::new(batch_size).ok_or(EngineError::InvalidBatchSize)?;
        Ok(Self {
            summarizer,
            batch_size,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// One summary per record, in record order.
    pub async fn summarize_many(&self, records: &[FileRecord]) -> Vec<FileSummary> {
        let total = records.len();
        let chunks = total.div_ceil(self.batch_size.get());
        let mut summaries = Vec::with_capacity(total);

        for (index, chunk) in records.chunks(self.batch_size.get()).enumerate() {
            debug!(chunk = index + 1, chunks, files = chunk.len(), "starting chunk");
            let results = join_all(chunk.iter().map(|r| self.summarizer.summarize_one(r))).await;
            summaries.extend(results);
            info!(done = summaries.len(), total, "progress");
        }

        summaries
    }
}
