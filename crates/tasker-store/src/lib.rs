//! # tasker-store
//!
//! Storage backends implementing the [`TaskStore`] port:
//!
//! - [`JsonFileStore`]: whole collection rewritten to a JSON array file
//! - [`SqliteStore`]: one row per task, incremental statements
//!
//! [`open_store`] picks one from [`StorageSettings`].

#![deny(unsafe_code)]

pub mod database;
mod error;
pub mod json_file;
pub mod schema;
pub mod sqlite;

pub use database::Database;
pub use json_file::JsonFileStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use tasker_core::{StoreError, TaskStore};
use tasker_settings::{StorageBackend, StorageSettings};

/// Open the backend named in `settings`.
pub fn open_store(settings: &StorageSettings) -> Result<Arc<dyn TaskStore>, StoreError> {
    let store: Arc<dyn TaskStore> = match settings.backend {
        StorageBackend::Json => Arc::new(JsonFileStore::open(&settings.path)),
        StorageBackend::Sqlite => Arc::new(SqliteStore::new(Database::open(&settings.path)?)),
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_json_backend() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StorageSettings {
            backend: StorageBackend::Json,
            path: dir.path().join("tasks.json"),
        };
        assert_eq!(open_store(&settings).unwrap().backend(), "json");
    }

    #[test]
    fn opens_sqlite_backend() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StorageSettings {
            backend: StorageBackend::Sqlite,
            path: dir.path().join("tasks.db"),
        };
        assert_eq!(open_store(&settings).unwrap().backend(), "sqlite");
        assert!(settings.path.exists());
    }
}
