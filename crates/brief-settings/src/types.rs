use brief_core::options::{DetailLevel, SummaryOptions};
use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BriefSettings {
    pub summary: SummarySettings,
    pub scan: ScanSettings,
    pub backend: BackendSettings,
    pub logging: LoggingSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummarySettings {
    pub detail_level: DetailLevel,
    pub max_length: u32,
}

impl Default for SummarySettings {
    fn default() -> Self {
        let defaults = SummaryOptions::default();
        Self {
            detail_level: defaults.detail_level,
            max_length: defaults.max_length,
        }
    }
}

impl SummarySettings {
    pub fn options(&self) -> SummaryOptions {
        SummaryOptions::new(self.detail_level, self.max_length)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanSettings {
    /// Files summarized concurrently per chunk.
    pub batch_size: usize,
    /// Files larger than this are never read.
    pub max_file_bytes: u64,
    pub output: String,
    /// Ignore-file name looked up at the scan root.
    pub ignore_file: String,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_file_bytes: 500 * 1024,
            output: "summaries.txt".to_string(),
            ignore_file: ".gitignore".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendSettings {
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Retries for transient backend errors. Zero disables retrying.
    pub max_retries: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Upper bound on one file's summarization call.
    pub request_timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250929".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 1024,
            temperature: 0.2,
            max_retries: 2,
            connect_timeout_secs: 30,
            idle_timeout_secs: 90,
            request_timeout_secs: 180,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
