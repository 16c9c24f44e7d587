//! # tasker-server
//!
//! Axum HTTP server for the task API.
//!
//! - Request pipeline: trace and access log → rate limiter → CORS gate → router
//! - Routes: `/tasks` and `/tasks/{id}` CRUD over an injected `TaskStore`
//! - Uniform `{"error": "..."}` bodies for every failure
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod cors;
pub mod errors;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use errors::ApiError;
pub use server::{AppState, ServerHandle, TaskerServer};
