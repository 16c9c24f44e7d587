//! Shape checks for creation and update payloads.
//!
//! Both validators work on the raw JSON value so that a wrongly typed field
//! (`"title": 123`) gets its own rejection message instead of a generic
//! deserialization error. Title uniqueness is not checked here: the store
//! enforces it atomically at write time.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::task::{MAX_TITLE_CHARS, NewTask, TaskPatch};

/// Why a payload was rejected. `Display` is the message sent to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Body parsed as JSON but is not an object.
    #[error("Task payload must be a JSON object")]
    NotAnObject,
    /// Creation without a usable title.
    #[error("Task must have a valid, non-empty title")]
    MissingTitle,
    /// Update carrying a title that is not a non-empty string.
    #[error("Task title must be a non-empty string")]
    InvalidTitle,
    /// Title longer than [`MAX_TITLE_CHARS`].
    #[error("Task title must be 100 characters or fewer")]
    TitleTooLong,
    /// `completed` present but not a boolean.
    #[error("Task completed must be a boolean")]
    CompletedNotBoolean,
}

/// Validate a creation payload.
pub fn validate_create(payload: &Value) -> Result<NewTask, ValidationError> {
    let fields = as_object(payload)?;

    let title = match fields.get("title") {
        Some(Value::String(title)) if !title.trim().is_empty() => title,
        _ => return Err(ValidationError::MissingTitle),
    };
    check_title_length(title)?;
    let completed = optional_bool(fields)?.unwrap_or(false);

    Ok(NewTask {
        title: title.clone(),
        completed,
    })
}

/// Validate a partial update. Every field is optional; `{}` is a valid no-op.
pub fn validate_update(payload: &Value) -> Result<TaskPatch, ValidationError> {
    let fields = as_object(payload)?;

    let title = match fields.get("title") {
        None => None,
        Some(Value::String(title)) if !title.trim().is_empty() => {
            check_title_length(title)?;
            Some(title.clone())
        }
        Some(_) => return Err(ValidationError::InvalidTitle),
    };
    let completed = optional_bool(fields)?;

    Ok(TaskPatch { title, completed })
}

fn as_object(payload: &Value) -> Result<&Map<String, Value>, ValidationError> {
    payload.as_object().ok_or(ValidationError::NotAnObject)
}

fn check_title_length(title: &str) -> Result<(), ValidationError> {
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(())
}

fn optional_bool(fields: &Map<String, Value>) -> Result<Option<bool>, ValidationError> {
    match fields.get("completed") {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ValidationError::CompletedNotBoolean),
    }
}
