//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tasker_settings::TaskerSettings;

/// Configuration for the Tasker server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Origins that receive cross-origin headers.
    pub allowed_origins: Vec<String>,
    /// Whether requests are throttled per client.
    pub rate_limit_enabled: bool,
    /// Requests allowed per client inside one window.
    pub rate_limit_max_requests: usize,
    /// Sliding window length in seconds.
    pub rate_limit_window_secs: u64,
    /// How often idle rate-limit buckets are dropped, in seconds.
    pub rate_limit_sweep_secs: u64,
}

impl ServerConfig {
    /// Take the server-facing parts of the loaded settings.
    pub fn from_settings(settings: &TaskerSettings) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            allowed_origins: settings.cors.allowed_origins.clone(),
            rate_limit_enabled: settings.rate_limit.enabled,
            rate_limit_max_requests: settings.rate_limit.max_requests,
            rate_limit_window_secs: settings.rate_limit.window_secs,
            ..Self::default()
        }
    }

    /// Rate-limit window as a [`Duration`].
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            allowed_origins: vec!["http://localhost:3000".into()],
            rate_limit_enabled: true,
            rate_limit_max_requests: 100,
            rate_limit_window_secs: 15 * 60,
            rate_limit_sweep_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_loopback_on_random_port() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 0);
    }

    #[test]
    fn default_rate_limit() {
        let cfg = ServerConfig::default();
        assert!(cfg.rate_limit_enabled);
        assert_eq!(cfg.rate_limit_max_requests, 100);
        assert_eq!(cfg.rate_limit_window(), Duration::from_secs(900));
    }

    #[test]
    fn from_settings_copies_values() {
        let mut settings = TaskerSettings::default();
        settings.server.port = 8088;
        settings.cors.allowed_origins = vec!["https://app.example".into()];
        settings.rate_limit.enabled = false;
        settings.rate_limit.max_requests = 5;

        let cfg = ServerConfig::from_settings(&settings);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8088);
        assert_eq!(cfg.allowed_origins, vec!["https://app.example"]);
        assert!(!cfg.rate_limit_enabled);
        assert_eq!(cfg.rate_limit_max_requests, 5);
        assert_eq!(cfg.rate_limit_sweep_secs, 60);
    }
}
