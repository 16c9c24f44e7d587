//! Task record and the payload shapes used to create and change it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Longest accepted title, counted in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Store-assigned task identity. Always a positive integer.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// The id a store hands out first.
    pub const FIRST: Self = Self(1);

    /// Wrap a raw value, rejecting zero and negatives.
    pub fn new(raw: i64) -> Result<Self, TaskIdError> {
        if raw > 0 { Ok(Self(raw)) } else { Err(TaskIdError) }
    }

    /// Raw integer value, for SQL parameters and logging.
    pub fn get(self) -> i64 {
        self.0
    }

    /// The id following this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A path token that is not a positive integer literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid task id")]
pub struct TaskIdError;

impl FromStr for TaskId {
    type Err = TaskIdError;

    /// Accepts ASCII digits only: no sign, no fraction, no whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TaskIdError);
        }
        let raw: i64 = s.parse().map_err(|_| TaskIdError)?;
        Self::new(raw)
    }
}

/// A stored task.
///
/// Timestamps are only kept by the row-backed store; the file-backed store
/// leaves them out and they are omitted from the JSON body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identity.
    pub id: TaskId,
    /// Non-empty title, unique across tasks ignoring case.
    pub title: String,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Creation time (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last modification time (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Task {
    /// Case-insensitive title comparison used for uniqueness.
    pub fn title_matches(&self, title: &str) -> bool {
        title_key(&self.title) == title_key(title)
    }
}

/// Normalised form under which titles must be unique (Unicode lowercase).
pub fn title_key(title: &str) -> String {
    title.to_lowercase()
}

/// A validated creation payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewTask {
    /// Title as supplied by the client.
    pub title: String,
    /// Defaults to `false` when the client omits it.
    pub completed: bool,
}

/// A validated partial update. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement completion flag.
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }

    /// Merge the supplied fields into `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title.clone_from(title);
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}
