//! Row-backed task storage.
//!
//! Each operation is a single statement (plus a read-back) executed under the
//! [`Database`] mutex on a blocking thread. The unique index on `title_key`
//! (the lowercased title) enforces uniqueness; its violation is reported as
//! [`StoreError::Conflict`].

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tasker_core::{
    NewTask, StoreError, StoreResult, Task, TaskId, TaskPatch, TaskStore, title_key,
};
use tracing::{debug, instrument};

use crate::database::Database;
use crate::error::{classify, database};

const SELECT_TASK: &str = "SELECT id, title, completed, created_at, updated_at FROM tasks";

/// Get current UTC timestamp as ISO 8601 string.
fn now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// `SQLite`-backed [`TaskStore`].
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Wrap an opened database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Run `f` against the connection without blocking the async runtime.
    async fn run<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.with_conn(f))
            .await
            .map_err(|e| StoreError::Database(format!("blocking task failed: {e}")))?
    }
}

#[async_trait]
impl TaskStore for SqliteStore {
    #[instrument(skip(self))]
    async fn list(&self) -> StoreResult<Vec<Task>> {
        self.run(|conn| {
            let mut stmt = conn
                .prepare(&format!("{SELECT_TASK} ORDER BY id ASC"))
                .map_err(database)?;
            let rows = stmt
                .query_map([], task_from_row)
                .map_err(database)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(database)?;
            Ok(rows)
        })
        .await
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn get(&self, id: TaskId) -> StoreResult<Task> {
        self.run(move |conn| fetch(conn, id)?.ok_or(StoreError::NotFound(id)))
            .await
    }

    #[instrument(skip(self, task), fields(title = %task.title))]
    async fn insert(&self, task: NewTask) -> StoreResult<Task> {
        self.run(move |conn| {
            let now = now_iso();
            let _ = conn
                .execute(
                    "INSERT INTO tasks (title, title_key, completed, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)",
                    params![task.title, title_key(&task.title), task.completed, now],
                )
                .map_err(|e| classify(e, &task.title))?;

            let id = TaskId::new(conn.last_insert_rowid())
                .map_err(|e| StoreError::Database(format!("rowid: {e}")))?;
            debug!(task_id = %id, "task inserted");
            fetch(conn, id)?.ok_or(StoreError::NotFound(id))
        })
        .await
    }

    #[instrument(skip(self, patch), fields(task_id = %id))]
    async fn update(&self, id: TaskId, patch: TaskPatch) -> StoreResult<Task> {
        self.run(move |conn| {
            if patch.is_empty() {
                return fetch(conn, id)?.ok_or(StoreError::NotFound(id));
            }

            // Build dynamic SET clause
            let mut sets: Vec<&str> = Vec::new();
            let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if let Some(ref title) = patch.title {
                sets.push("title = ?");
                values.push(Box::new(title.clone()));
                sets.push("title_key = ?");
                values.push(Box::new(title_key(title)));
            }
            if let Some(completed) = patch.completed {
                sets.push("completed = ?");
                values.push(Box::new(completed));
            }
            sets.push("updated_at = ?");
            values.push(Box::new(now_iso()));
            values.push(Box::new(id.get()));

            let sql = format!("UPDATE tasks SET {} WHERE id = ?", sets.join(", "));
            let params_refs: Vec<&dyn rusqlite::types::ToSql> =
                values.iter().map(AsRef::as_ref).collect();
            let changed = conn
                .execute(&sql, params_refs.as_slice())
                .map_err(|e| classify(e, patch.title.as_deref().unwrap_or_default()))?;

            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }
            fetch(conn, id)?.ok_or(StoreError::NotFound(id))
        })
        .await
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn delete(&self, id: TaskId) -> StoreResult<()> {
        self.run(move |conn| {
            let changed = conn
                .execute("DELETE FROM tasks WHERE id = ?1", params![id.get()])
                .map_err(database)?;
            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

fn fetch(conn: &Connection, id: TaskId) -> StoreResult<Option<Task>> {
    conn.query_row(
        &format!("{SELECT_TASK} WHERE id = ?1"),
        params![id.get()],
        task_from_row,
    )
    .optional()
    .map_err(database)
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let raw_id: i64 = row.get("id")?;
    let id = TaskId::new(raw_id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Integer, Box::new(e))
    })?;
    Ok(Task {
        id,
        title: row.get("title")?,
        completed: row.get("completed")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
