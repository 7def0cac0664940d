use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_LENGTH: u32 = 500;

/// How much the backend is asked to elaborate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl DetailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown detail level '{other}' (expected low, medium or high)")),
        }
    }
}

/// Shapes each summarization request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryOptions {
    pub detail_level: DetailLevel,
    /// Character budget, embedded verbatim in the prompt.
    pub max_length: u32,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            detail_level: DetailLevel::Medium,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl SummaryOptions {
    /// Zero budgets fall back to the default.
    pub fn new(detail_level: DetailLevel, max_length: u32) -> Self {
        Self {
            detail_level,
            max_length: if max_length == 0 { DEFAULT_MAX_LENGTH } else { max_length },
        }
    }
}
