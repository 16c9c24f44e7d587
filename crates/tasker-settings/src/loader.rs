//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`TaskerSettings::default()`]
//! 2. If a settings file is given and exists, deep-merge its values over defaults
//! 3. Apply `TASKER_*` environment overrides (highest priority)
//! 4. Reject values the server cannot run with
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::{Result, SettingsError};
use crate::types::{StorageBackend, TaskerSettings};

/// An environment override that was present but could not be parsed.
///
/// Loading runs before logging is initialised, so these are handed back to
/// the caller to report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IgnoredOverride {
    /// Variable name, e.g. `TASKER_PORT`.
    pub key: &'static str,
    /// The raw value that was rejected.
    pub value: String,
}

/// Settings plus what the loader did to produce them.
#[derive(Clone, Debug)]
pub struct LoadedSettings {
    /// Final, validated settings.
    pub settings: TaskerSettings,
    /// Settings file that was merged, if one existed.
    pub file: Option<PathBuf>,
    /// Environment overrides that were skipped.
    pub ignored: Vec<IgnoredOverride>,
}

/// Load settings from an optional file plus the process environment.
///
/// A missing file yields defaults; a file with invalid JSON is an error.
pub fn load(path: Option<&Path>) -> Result<LoadedSettings> {
    let defaults = serde_json::to_value(TaskerSettings::default())?;

    let (merged, file) = match path {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(path)?;
            let user: Value = serde_json::from_str(&content)?;
            (deep_merge(defaults, user), Some(path.to_owned()))
        }
        _ => (defaults, None),
    };

    let mut settings: TaskerSettings = serde_json::from_value(merged)?;
    let ignored = apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(LoadedSettings {
        settings,
        file,
        ignored,
    })
}

/// [`load`] without the loader report.
pub fn load_settings(path: Option<&Path>) -> Result<TaskerSettings> {
    load(path).map(|loaded| loaded.settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(settings: &mut TaskerSettings) -> Vec<IgnoredOverride> {
    apply_overrides(settings, |name| std::env::var(name).ok())
}

/// Apply overrides from an arbitrary variable lookup.
///
/// Invalid values leave the file/default value in place and are returned.
pub fn apply_overrides<F>(settings: &mut TaskerSettings, lookup: F) -> Vec<IgnoredOverride>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let mut ignored = Vec::new();
    let mut reject = |key: &'static str, value: String| {
        ignored.push(IgnoredOverride { key, value });
    };

    if let Some(v) = read("TASKER_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read("TASKER_PORT") {
        match parse_u16_range(&v, 0, u16::MAX) {
            Some(port) => settings.server.port = port,
            None => reject("TASKER_PORT", v),
        }
    }
    if let Some(v) = read("TASKER_STORAGE") {
        match parse_backend(&v) {
            Some(backend) => settings.storage.backend = backend,
            None => reject("TASKER_STORAGE", v),
        }
    }
    if let Some(v) = read("TASKER_DB_FILE") {
        settings.storage.path = PathBuf::from(v);
    }
    if let Some(v) = read("TASKER_ALLOWED_ORIGINS") {
        settings.cors.allowed_origins = parse_list(&v);
    }
    if let Some(v) = read("TASKER_RATE_LIMIT") {
        match parse_bool(&v) {
            Some(enabled) => settings.rate_limit.enabled = enabled,
            None => reject("TASKER_RATE_LIMIT", v),
        }
    }
    if let Some(v) = read("TASKER_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read("TASKER_LOG_FILE") {
        settings.logging.file = Some(PathBuf::from(v));
    }
    ignored
}

fn validate(settings: &TaskerSettings) -> Result<()> {
    if settings.rate_limit.max_requests == 0 {
        return Err(SettingsError::InvalidValue(
            "rateLimit.maxRequests must be at least 1".to_string(),
        ));
    }
    if settings.rate_limit.window_secs == 0 {
        return Err(SettingsError::InvalidValue(
            "rateLimit.windowSecs must be at least 1".to_string(),
        ));
    }
    if settings.storage.path.as_os_str().is_empty() {
        return Err(SettingsError::InvalidValue(
            "storage.path must not be empty".to_string(),
        ));
    }
    Ok(())
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a backend name (`json` or `sqlite`, case-insensitive).
pub fn parse_backend(val: &str) -> Option<StorageBackend> {
    serde_json::from_value(Value::String(val.to_lowercase())).ok()
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
