//! # tasker-core
//!
//! Domain types shared by every Tasker crate.
//!
//! - [`Task`] and its identity type [`TaskId`]
//! - Creation and partial-update payloads ([`NewTask`], [`TaskPatch`])
//! - Payload validation returning a client-facing [`ValidationError`]
//! - The [`TaskStore`] port that storage backends implement

#![deny(unsafe_code)]

pub mod store;
pub mod task;
pub mod validation;

pub use store::{StoreError, StoreResult, TaskStore};
pub use task::{MAX_TITLE_CHARS, NewTask, Task, TaskId, TaskIdError, TaskPatch, title_key};
pub use validation::{ValidationError, validate_create, validate_update};
