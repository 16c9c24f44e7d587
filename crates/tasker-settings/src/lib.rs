//! # tasker-settings
//!
//! Configuration for the Tasker server, loaded once at startup from three
//! layers (in priority order):
//! 1. **Compiled defaults**: [`TaskerSettings::default()`]
//! 2. **Settings file**: optional JSON file, deep-merged over defaults
//! 3. **Environment variables**: `TASKER_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    IgnoredOverride, LoadedSettings, apply_env_overrides, apply_overrides, deep_merge, load,
    load_settings,
};
pub use types::*;
