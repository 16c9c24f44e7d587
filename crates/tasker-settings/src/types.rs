//! Settings type definitions.
//!
//! All types use camelCase JSON field names and `#[serde(default)]`, so a
//! settings file only needs to name the values it changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings type.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskerSettings {
    /// Listener settings.
    pub server: ServerSettings,
    /// Task storage backend.
    pub storage: StorageSettings,
    /// Cross-origin allow-list.
    pub cors: CorsSettings,
    /// Per-client request throttling.
    pub rate_limit: RateLimitSettings,
    /// Log level and destination.
    pub logging: LoggingSettings,
}

/// Listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Port to bind (`0` for auto-assign).
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Which storage implementation backs the API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Whole collection kept in one JSON array file.
    #[default]
    Json,
    /// One row per task in a `SQLite` database.
    Sqlite,
}

/// Task storage settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Backend selection.
    pub backend: StorageBackend,
    /// JSON file or database path, depending on the backend.
    pub path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            path: PathBuf::from("tasks.json"),
        }
    }
}

/// Cross-origin settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorsSettings {
    /// Origins that receive cross-origin response headers.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Sliding-window rate limit settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitSettings {
    /// When `false`, every request is let through (used by automated tests).
    pub enabled: bool,
    /// Requests allowed per client inside one window.
    pub max_requests: usize,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive. `RUST_LOG` wins when set.
    pub level: String,
    /// Optional file that receives a copy of every log line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = TaskerSettings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.storage.backend, StorageBackend::Json);
        assert_eq!(settings.storage.path, PathBuf::from("tasks.json"));
        assert_eq!(settings.cors.allowed_origins, vec!["http://localhost:3000"]);
        assert!(settings.rate_limit.enabled);
        assert_eq!(settings.rate_limit.max_requests, 100);
        assert_eq!(settings.rate_limit.window_secs, 900);
        assert_eq!(settings.logging.level, "info");
        assert!(settings.logging.file.is_none());
    }

    #[test]
    fn camel_case_field_names() {
        let json = serde_json::to_value(TaskerSettings::default()).unwrap();
        assert!(json["rateLimit"]["maxRequests"].is_number());
        assert!(json["rateLimit"]["windowSecs"].is_number());
        assert!(json["cors"]["allowedOrigins"].is_array());
        assert!(json["logging"].get("file").is_none());
    }

    #[test]
    fn backend_wire_names() {
        assert_eq!(serde_json::to_value(StorageBackend::Json).unwrap(), "json");
        assert_eq!(serde_json::to_value(StorageBackend::Sqlite).unwrap(), "sqlite");
        let parsed: StorageBackend = serde_json::from_str("\"sqlite\"").unwrap();
        assert_eq!(parsed, StorageBackend::Sqlite);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: TaskerSettings =
            serde_json::from_str(r#"{"rateLimit": {"enabled": false}}"#).unwrap();
        assert!(!settings.rate_limit.enabled);
        assert_eq!(settings.rate_limit.max_requests, 100);
        assert_eq!(settings.server.port, 3000);
    }
}
