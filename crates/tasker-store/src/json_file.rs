//! File-backed task storage.
//!
//! The whole collection lives in memory and is rewritten to a single JSON
//! array file after every mutation. One async mutex covers the check, the id
//! assignment and the file write, so concurrent creates cannot both pass the
//! uniqueness check or receive the same id.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tasker_core::{NewTask, StoreError, StoreResult, Task, TaskId, TaskPatch, TaskStore};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

struct FileState {
    tasks: Vec<Task>,
    /// Next id to hand out. Only ever grows, so ids freed by a delete are
    /// not reused while the process runs.
    next_id: TaskId,
}

/// JSON-array-file-backed [`TaskStore`].
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl JsonFileStore {
    /// Load the collection from `path`.
    ///
    /// A missing, unreadable, or corrupt file yields an empty collection; the
    /// file is (re)written on the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tasks = load_tasks(&path);
        let next_id = next_id_after(&tasks);
        info!(path = %path.display(), count = tasks.len(), "task file loaded");

        Self {
            path,
            state: Mutex::new(FileState { tasks, next_id }),
        }
    }

    /// Backing file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `tasks` to a sibling temp file, sync it, then rename over the
    /// target.
    async fn persist(&self, tasks: &[Task]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(tasks)?;
        let tmp = temp_path(&self.path);
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&body).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), count = tasks.len(), "task file written");
        Ok(())
    }
}

#[async_trait]
impl TaskStore for JsonFileStore {
    async fn list(&self) -> StoreResult<Vec<Task>> {
        Ok(self.state.lock().await.tasks.clone())
    }

    async fn get(&self, id: TaskId) -> StoreResult<Task> {
        let state = self.state.lock().await;
        state
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    #[instrument(skip(self, task), fields(title = %task.title))]
    async fn insert(&self, task: NewTask) -> StoreResult<Task> {
        let mut state = self.state.lock().await;
        if state.tasks.iter().any(|t| t.title_matches(&task.title)) {
            return Err(StoreError::Conflict(task.title));
        }

        let created = Task {
            id: state.next_id,
            title: task.title,
            completed: task.completed,
            created_at: None,
            updated_at: None,
        };
        let mut tasks = state.tasks.clone();
        tasks.push(created.clone());
        self.persist(&tasks).await?;

        state.tasks = tasks;
        state.next_id = created.id.next();
        Ok(created)
    }

    #[instrument(skip(self, patch), fields(task_id = %id))]
    async fn update(&self, id: TaskId, patch: TaskPatch) -> StoreResult<Task> {
        let mut state = self.state.lock().await;
        let index = state
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;

        if let Some(ref title) = patch.title {
            let taken = state
                .tasks
                .iter()
                .any(|t| t.id != id && t.title_matches(title));
            if taken {
                return Err(StoreError::Conflict(title.clone()));
            }
        }
        if patch.is_empty() {
            return Ok(state.tasks[index].clone());
        }

        let mut tasks = state.tasks.clone();
        patch.apply_to(&mut tasks[index]);
        let updated = tasks[index].clone();
        self.persist(&tasks).await?;

        state.tasks = tasks;
        Ok(updated)
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn delete(&self, id: TaskId) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let index = state
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let mut tasks = state.tasks.clone();
        let _ = tasks.remove(index);
        self.persist(&tasks).await?;

        state.tasks = tasks;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "json"
    }
}

fn load_tasks(path: &Path) -> Vec<Task> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "task file unreadable, starting empty");
            return Vec::new();
        }
    };
    let mut tasks: Vec<Task> = match serde_json::from_str(&content) {
        Ok(tasks) => tasks,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "task file corrupt, starting empty");
            return Vec::new();
        }
    };
    tasks.sort_by_key(|t| t.id);
    tasks
}

fn next_id_after(tasks: &[Task]) -> TaskId {
    tasks
        .iter()
        .map(|t| t.id)
        .max()
        .map_or(TaskId::FIRST, TaskId::next)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
