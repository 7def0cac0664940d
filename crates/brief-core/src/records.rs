use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::capability::FAILED_SUMMARY;
use crate::taxonomy::{ClassifiedError, ErrorCode};

pub const TOO_LARGE_SUMMARY: &str = "File is too large to summarize.";

/// A discovered file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub absolute_path: PathBuf,
    /// Relative to the scan root, `/`-separated.
    pub relative_path: String,
}

impl FileRecord {
    pub fn new(absolute_path: PathBuf, relative_path: impl Into<String>) -> Self {
        Self {
            absolute_path,
            relative_path: relative_path.into(),
        }
    }
}

/// How a [`FileSummary`] came to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "code")]
pub enum SummaryStatus {
    Summarized,
    TooLarge,
    CapabilityFailed,
    Unreadable(ErrorCode),
}

impl SummaryStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::CapabilityFailed | Self::Unreadable(_))
    }
}

/// One line of the report. Every input file produces exactly one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub relative_path: String,
    pub summary: String,
    pub status: SummaryStatus,
}

impl FileSummary {
    pub fn summarized(relative_path: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            summary: summary.into(),
            status: SummaryStatus::Summarized,
        }
    }

    pub fn too_large(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            summary: TOO_LARGE_SUMMARY.to_string(),
            status: SummaryStatus::TooLarge,
        }
    }

    pub fn capability_failed(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            summary: FAILED_SUMMARY.to_string(),
            status: SummaryStatus::CapabilityFailed,
        }
    }

    /// The summary names the category so the report explains the failure.
    pub fn unreadable(relative_path: impl Into<String>, error: &ClassifiedError) -> Self {
        Self {
            relative_path: relative_path.into(),
            summary: format!("Could not summarize file ({}): {}", error.code, error.message),
            status: SummaryStatus::Unreadable(error.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::classify;

    #[test]
    fn sentinels() {
        assert_eq!(FileSummary::too_large("a.js").summary, "File is too large to summarize.");
        assert_eq!(
            FileSummary::capability_failed("a.js").summary,
            "Failed to generate summary."
        );
    }

    #[test]
    fn unreadable_names_category() {
        let err = classify(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        let summary = FileSummary::unreadable("secret.py", &err);
        assert!(summary.summary.contains("FILE_SYSTEM_ERROR"));
        assert_eq!(summary.status, SummaryStatus::Unreadable(ErrorCode::FileSystemError));
        assert!(summary.status.is_failure());
    }

    #[test]
    fn status_serde_shape() {
        let json = serde_json::to_value(SummaryStatus::Unreadable(ErrorCode::FileSystemError)).unwrap();
        assert_eq!(json["status"], "unreadable");
        assert_eq!(json["code"], "FILE_SYSTEM_ERROR");
        let json = serde_json::to_value(SummaryStatus::TooLarge).unwrap();
        assert_eq!(json["status"], "too_large");
    }
}
