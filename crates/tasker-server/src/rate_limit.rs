//! Per-client sliding-window rate limiting.
//!
//! Each client key owns a queue of request instants. A check prunes instants
//! that fell out of the window, records the current request, and compares
//! the queue length against the limit. The whole sequence runs while holding
//! the key's map entry, so concurrent bursts from one client cannot undercount.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tracing::warn;

use crate::config::ServerConfig;
use crate::errors::ApiError;

/// Sliding-window request counter keyed by client address.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    buckets: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    /// Allow `max_requests` per client inside every trailing `window`.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            buckets: DashMap::new(),
        }
    }

    /// Build from the server's rate limit configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.rate_limit_max_requests, config.rate_limit_window())
    }

    /// Record a request from `key` now. Returns `false` when over the limit.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    /// Record a request from `key` at `now`.
    ///
    /// Rejected requests are still recorded, so a client that keeps sending
    /// while limited stays limited.
    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut bucket = self.buckets.entry(key.to_string()).or_default();
        while bucket
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) >= self.window)
        {
            let _ = bucket.pop_front();
        }
        bucket.push_back(now);
        bucket.len() <= self.max_requests
    }

    /// Drop instants outside the window and forget clients with none left.
    pub fn sweep(&self, now: Instant) {
        self.buckets.retain(|_, bucket| {
            bucket.retain(|&t| now.saturating_duration_since(t) < self.window);
            !bucket.is_empty()
        });
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}

/// Middleware that rejects over-limit clients with 429 before routing.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    if limiter.check(&key) {
        return next.run(request).await;
    }
    warn!(client = %key, "rate limit exceeded");
    ApiError::RateLimited.into_response()
}

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |info| info.0.ip().to_string())
}
