//! Storage port.
//!
//! The router only ever talks to a `dyn TaskStore`. Implementations must
//! serialise mutations so that id assignment and the title uniqueness check
//! happen atomically with the write, and must persist before returning.

use async_trait::async_trait;
use thiserror::Error;

use crate::task::{NewTask, Task, TaskId, TaskPatch};

/// Errors returned by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No task with this id.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Another task already uses this title (ignoring case).
    #[error("duplicate title: {0}")]
    Conflict(String),

    /// The database rejected or failed a statement.
    #[error("database error: {0}")]
    Database(String),

    /// Reading or writing the backing file failed.
    #[error("IO error: {0}")]
    Io(String),

    /// Persisted state could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks in insertion (ascending id) order.
    async fn list(&self) -> StoreResult<Vec<Task>>;

    /// One task, or [`StoreError::NotFound`].
    async fn get(&self, id: TaskId) -> StoreResult<Task>;

    /// Store a new task with the next id. Fails with
    /// [`StoreError::Conflict`] on a case-insensitive title clash.
    async fn insert(&self, task: NewTask) -> StoreResult<Task>;

    /// Merge the supplied fields into an existing task.
    async fn update(&self, id: TaskId, patch: TaskPatch) -> StoreResult<Task>;

    /// Remove a task. Its id is never handed out again.
    async fn delete(&self, id: TaskId) -> StoreResult<()>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}
