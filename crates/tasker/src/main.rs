//! # tasker
//!
//! Tasker server binary: loads settings, starts logging, opens the task
//! store, and serves the HTTP API until Ctrl-C.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tasker_server::shutdown::wait_for_signal;
use tasker_server::{ServerConfig, TaskerServer};
use tasker_settings::loader::parse_backend;
use tasker_settings::{IgnoredOverride, StorageBackend, TaskerSettings};

/// Tasker task API server.
#[derive(Parser, Debug)]
#[command(name = "tasker", about = "Task tracking HTTP API")]
struct Cli {
    /// JSON settings file (missing file means defaults).
    #[arg(long, default_value = "tasker.json")]
    config: PathBuf,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Storage backend: `json` or `sqlite` (overrides settings).
    #[arg(long, value_parser = parse_storage)]
    storage: Option<StorageBackend>,

    /// Task file or database path (overrides settings).
    #[arg(long)]
    db_file: Option<PathBuf>,

    /// Disable per-client rate limiting.
    #[arg(long)]
    no_rate_limit: bool,
}

impl Cli {
    /// Apply command-line flags over loaded settings.
    fn apply(&self, settings: &mut TaskerSettings) {
        if let Some(ref host) = self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(backend) = self.storage {
            settings.storage.backend = backend;
        }
        if let Some(ref path) = self.db_file {
            settings.storage.path.clone_from(path);
        }
        if self.no_rate_limit {
            settings.rate_limit.enabled = false;
        }
    }
}

fn parse_storage(val: &str) -> Result<StorageBackend, String> {
    parse_backend(val).ok_or_else(|| format!("unknown storage backend '{val}' (json, sqlite)"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = tasker_settings::load(Some(&cli.config))
        .with_context(|| format!("Failed to load settings from {}", cli.config.display()))?;
    let mut settings = loaded.settings;
    cli.apply(&mut settings);

    tasker_logging::init_subscriber(&settings.logging.level, settings.logging.file.as_deref())
        .context("Failed to open log file")?;

    match &loaded.file {
        Some(path) => tracing::info!(path = %path.display(), "settings file loaded"),
        None => tracing::debug!(path = %cli.config.display(), "no settings file, using defaults"),
    }
    for IgnoredOverride { key, value } in &loaded.ignored {
        tracing::warn!(key, value = %value, "invalid env var, ignoring");
    }

    let store = tasker_store::open_store(&settings.storage).with_context(|| {
        format!(
            "Failed to open task store at {}",
            settings.storage.path.display()
        )
    })?;

    let server = TaskerServer::new(ServerConfig::from_settings(&settings), store);
    let handle = server.listen().await.with_context(|| {
        format!(
            "Failed to bind {}:{}",
            settings.server.host, settings.server.port
        )
    })?;
    tracing::info!(addr = %handle.addr(), "server ready");

    wait_for_signal().await;
    tracing::info!("shutting down");
    let _ = server
        .shutdown()
        .graceful_shutdown(handle.into_tasks(), None)
        .await;

    Ok(())
}
