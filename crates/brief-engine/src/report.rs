use std::path::Path;

use brief_core::records::FileSummary;
use tracing::info;

use crate::error::EngineError;

/// Render summaries as `path\nsummary\n` entries separated by a blank line.
pub fn render(summaries: &[FileSummary]) -> String {
    summaries
        .iter()
        .map(|s| format!("{}\n{}\n", s.relative_path, s.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the whole report in one go, replacing any existing file.
pub async fn write(summaries: &[FileSummary], output: &Path) -> Result<(), EngineError> {
    let body = render(summaries);
    tokio::fs::write(output, body.as_bytes())
        .await
        .map_err(|source| EngineError::ReportWrite {
            path: output.to_path_buf(),
            source,
        })?;
    info!(path = %output.display(), entries = summaries.len(), bytes = body.len(), "report written");
    Ok(())
}
