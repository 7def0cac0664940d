//! Settings error types.

use brief_core::taxonomy::{ClassifiedError, Classify, ErrorCode};
use thiserror::Error;

/// Errors that can occur when loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in the settings file.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A settings value was out of range.
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

impl Classify for &SettingsError {
    fn classify(self) -> ClassifiedError {
        let origin = match self {
            SettingsError::Io(_) => "io",
            SettingsError::Json(_) => "json",
            SettingsError::InvalidValue(_) => "value",
        };
        ClassifiedError::new(ErrorCode::ConfigError, self.to_string()).with_context("origin", origin)
    }
}
