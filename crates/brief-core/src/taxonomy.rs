//! Error taxonomy shared by every pipeline stage.
//!
//! Failures raised at a known site (backend, filesystem, configuration) are
//! mapped by variant. Failures arriving through an opaque boundary are
//! sniffed against an ordered rule list and fall back to
//! [`ErrorCode::UnknownError`]. Classifying a [`ClassifiedError`] again
//! returns it unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

use crate::errors::GatewayError;

const UNKNOWN_MESSAGE: &str = "An unexpected error occurred";

/// Closed set of failure categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AuthError,
    ApiKeyError,
    LlmError,
    FileSystemError,
    ConfigError,
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthError => "AUTH_ERROR",
            Self::ApiKeyError => "API_KEY_ERROR",
            Self::LlmError => "LLM_ERROR",
            Self::FileSystemError => "FILE_SYSTEM_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// HTTP-style status for an embedding service layer.
    pub fn default_status(&self) -> u16 {
        match self {
            Self::AuthError | Self::ApiKeyError => 401,
            Self::LlmError => 502,
            Self::FileSystemError | Self::ConfigError | Self::UnknownError => 500,
        }
    }

    pub fn default_retryable(&self) -> bool {
        matches!(self, Self::LlmError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure after classification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {message}")]
pub struct ClassifiedError {
    pub code: ErrorCode,
    pub message: String,
    pub is_retryable: bool,
    /// HTTP-style status; higher is more severe.
    pub severity: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl ClassifiedError {
    /// Build with the category defaults, for failures raised at a known site.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            is_retryable: code.default_retryable(),
            severity: code.default_status(),
            context: None,
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.is_retryable = retryable;
        self
    }

    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.as_ref()?.get(key).map(String::as_str)
    }
}

/// Stable, serializable triple handed to whoever presents the failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
    pub code: ErrorCode,
    pub status: u16,
}

/// Conversion of a raw failure into a [`ClassifiedError`].
pub trait Classify {
    fn classify(self) -> ClassifiedError;
}

/// Classify any supported failure.
pub fn classify(raw: impl Classify) -> ClassifiedError {
    raw.classify()
}

/// Classify, log once with context, and return the presentable triple.
pub fn report(raw: impl Classify) -> ErrorReport {
    let classified = raw.classify();
    tracing::error!(
        code = %classified.code,
        status = classified.severity,
        retryable = classified.is_retryable,
        context = ?classified.context,
        "{}",
        classified.message
    );
    ErrorReport {
        message: classified.message,
        code: classified.code,
        status: classified.severity,
    }
}

struct Rule {
    markers: &'static [&'static str],
    code: ErrorCode,
}

// Evaluated top to bottom; first match wins. Case-sensitive.
const RULES: &[Rule] = &[
    Rule { markers: &["API key"], code: ErrorCode::ApiKeyError },
    Rule { markers: &["authentication", "Unauthorized"], code: ErrorCode::AuthError },
    Rule { markers: &["file not found", "ENOENT"], code: ErrorCode::FileSystemError },
    Rule { markers: &["config"], code: ErrorCode::ConfigError },
    Rule { markers: &["rate limit", "overloaded"], code: ErrorCode::LlmError },
];

fn classify_message(message: &str) -> ClassifiedError {
    RULES
        .iter()
        .find(|rule| rule.markers.iter().any(|m| message.contains(m)))
        .map(|rule| ClassifiedError::new(rule.code, message))
        .unwrap_or_else(|| {
            ClassifiedError::new(ErrorCode::UnknownError, UNKNOWN_MESSAGE).with_context("raw", message)
        })
}

impl Classify for ClassifiedError {
    fn classify(self) -> ClassifiedError {
        self
    }
}

impl Classify for &ClassifiedError {
    fn classify(self) -> ClassifiedError {
        self.clone()
    }
}

impl Classify for &GatewayError {
    fn classify(self) -> ClassifiedError {
        let code = match self {
            GatewayError::AuthenticationFailed(body) if body.contains("API key") => {
                ErrorCode::ApiKeyError
            }
            GatewayError::AuthenticationFailed(_) => ErrorCode::AuthError,
            _ => ErrorCode::LlmError,
        };
        let retryable = code == ErrorCode::LlmError && self.is_retryable();
        ClassifiedError::new(code, self.to_string())
            .with_retryable(retryable)
            .with_context("kind", self.error_kind())
    }
}

impl Classify for GatewayError {
    fn classify(self) -> ClassifiedError {
        (&self).classify()
    }
}

impl Classify for &io::Error {
    fn classify(self) -> ClassifiedError {
        let message = match self.kind() {
            io::ErrorKind::NotFound => format!("file not found: {self}"),
            io::ErrorKind::PermissionDenied => format!("permission denied: {self}"),
            _ => self.to_string(),
        };
        ClassifiedError::new(ErrorCode::FileSystemError, message)
            .with_context("kind", format!("{:?}", self.kind()))
    }
}

impl Classify for io::Error {
    fn classify(self) -> ClassifiedError {
        (&self).classify()
    }
}

impl Classify for &str {
    fn classify(self) -> ClassifiedError {
        classify_message(self)
    }
}

impl Classify for String {
    fn classify(self) -> ClassifiedError {
        classify_message(&self)
    }
}

impl Classify for &(dyn std::error::Error + 'static) {
    fn classify(self) -> ClassifiedError {
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(self);
        while let Some(err) = current {
            if let Some(classified) = err.downcast_ref::<ClassifiedError>() {
                return classified.clone();
            }
            if let Some(gateway) = err.downcast_ref::<GatewayError>() {
                return gateway.classify();
            }
            if let Some(io_err) = err.downcast_ref::<io::Error>() {
                return io_err.classify();
            }
            current = err.source();
        }
        classify_message(&self.to_string())
    }
}

impl Classify for &(dyn std::error::Error + Send + Sync + 'static) {
    fn classify(self) -> ClassifiedError {
        let plain: &(dyn std::error::Error + 'static) = self;
        plain.classify()
    }
}
