//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`BriefSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply `FILEBRIEF_*` environment overrides (highest priority)
//!
//! Loading runs before logging is configured, so rejected overrides are
//! returned as [`EnvWarning`]s for the caller to log once it can.

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};

use brief_core::options::DetailLevel;
use brief_core::security::ApiKey;
use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::BriefSettings;

pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// A `FILEBRIEF_*` value that was rejected; the setting kept its prior value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvWarning {
    pub key: String,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for EnvWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}: {}, ignoring", self.key, self.value, self.reason)
    }
}

/// Resolved settings plus the overrides that were rejected on the way.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedSettings {
    pub settings: BriefSettings,
    pub warnings: Vec<EnvWarning>,
}

/// `~/.filebrief/settings.json`.
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".filebrief").join("settings.json")
}

/// Load from the default path with process-environment overrides.
pub fn load_settings() -> Result<LoadedSettings> {
    load_settings_from_path(&settings_path())
}

/// Load from a specific path with process-environment overrides.
///
/// A missing file yields defaults; malformed JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<LoadedSettings> {
    load_settings_with(path, |name| std::env::var(name).ok())
}

/// Same as [`load_settings_from_path`] with an injectable variable lookup.
pub fn load_settings_with<F>(path: &Path, lookup: F) -> Result<LoadedSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(BriefSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: BriefSettings = serde_json::from_value(merged)?;
    let warnings = apply_env_overrides(&mut settings, &lookup);
    validate(&settings)?;
    Ok(LoadedSettings { settings, warnings })
}

/// Recursive merge: objects merge per key, everything else is replaced,
/// nulls in `source` are skipped.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `FILEBRIEF_*` overrides. Invalid values leave the setting
/// unchanged and are returned as warnings.
pub fn apply_env_overrides<F>(settings: &mut BriefSettings, lookup: &F) -> Vec<EnvWarning>
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader {
        lookup,
        warnings: RefCell::new(Vec::new()),
    };

    if let Some(v) = env.string("FILEBRIEF_DETAIL_LEVEL") {
        match v.parse::<DetailLevel>() {
            Ok(level) => settings.summary.detail_level = level,
            Err(e) => env.reject("FILEBRIEF_DETAIL_LEVEL", &v, e.to_string()),
        }
    }
    if let Some(v) = env.u64("FILEBRIEF_MAX_LENGTH", 1, 100_000) {
        settings.summary.max_length = v as u32;
    }
    if let Some(v) = env.u64("FILEBRIEF_BATCH_SIZE", 1, 256) {
        settings.scan.batch_size = v as usize;
    }
    if let Some(v) = env.u64("FILEBRIEF_MAX_FILE_BYTES", 1, 1_073_741_824) {
        settings.scan.max_file_bytes = v;
    }
    if let Some(v) = env.string("FILEBRIEF_OUTPUT") {
        settings.scan.output = v;
    }
    if let Some(v) = env.string("FILEBRIEF_MODEL") {
        settings.backend.model = v;
    }
    if let Some(v) = env.string("FILEBRIEF_BASE_URL") {
        settings.backend.base_url = v;
    }
    if let Some(v) = env.u64("FILEBRIEF_MAX_RETRIES", 0, 10) {
        settings.backend.max_retries = v as u32;
    }
    if let Some(v) = env.string("FILEBRIEF_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("FILEBRIEF_LOG_JSON") {
        settings.logging.json = v;
    }
    env.warnings.into_inner()
}

/// Read the backend credential from the process environment.
pub fn api_key_from_env() -> Option<ApiKey> {
    api_key_with(|name| std::env::var(name).ok())
}

pub fn api_key_with<F>(lookup: F) -> Option<ApiKey>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(API_KEY_VAR)
        .filter(|v| !v.trim().is_empty())
        .map(ApiKey::new)
}

/// Reject values no layer may set. Callers that change settings after
/// loading (command-line flags) should validate again.
pub fn validate(settings: &BriefSettings) -> Result<()> {
    if settings.summary.max_length == 0 {
        return Err(SettingsError::InvalidValue("summary.maxLength must be positive".into()));
    }
    if settings.scan.max_file_bytes == 0 {
        return Err(SettingsError::InvalidValue("scan.maxFileBytes must be positive".into()));
    }
    if settings.backend.max_tokens == 0 {
        return Err(SettingsError::InvalidValue("backend.maxTokens must be positive".into()));
    }
    Ok(())
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Accepts (case-insensitive) `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

struct EnvReader<'a, F> {
    lookup: &'a F,
    warnings: RefCell<Vec<EnvWarning>>,
}

impl<F> EnvReader<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = self.string(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            self.reject(name, &val, "invalid boolean".into());
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            self.reject(name, &val, format!("expected an integer in {min}..={max}"));
        }
        result
    }

    fn reject(&self, name: &str, value: &str, reason: String) {
        self.warnings.borrow_mut().push(EnvWarning {
            key: name.to_string(),
            value: value.to_string(),
            reason,
        });
    }
}
