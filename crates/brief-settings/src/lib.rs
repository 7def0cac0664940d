//! # brief-settings
//!
//! Configuration for filebrief, loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`BriefSettings::default()`]
//! 2. **User file**: `~/.filebrief/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `FILEBRIEF_*` overrides (highest priority)
//!
//! The backend credential is read separately by [`api_key_from_env`] and
//! handed to the summarizer explicitly; nothing else reads the environment.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    api_key_from_env, deep_merge, load_settings, load_settings_from_path, load_settings_with,
    settings_path, validate, EnvWarning, LoadedSettings, API_KEY_VAR,
};
pub use types::*;
