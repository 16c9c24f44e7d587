//! Origin allow-list gate.
//!
//! An allowed `Origin` gets the cross-origin headers echoed back. A request
//! from any other origin passes through without them; enforcement is left to
//! the browser. Preflight (`OPTIONS`) requests are answered with 204 here and
//! never reach the router.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Parsed origin allow-list.
#[derive(Clone, Debug, Default)]
pub struct CorsGate {
    origins: Vec<HeaderValue>,
}

impl CorsGate {
    /// Parse the configured origins, skipping any that are not valid header values.
    pub fn new(allowed_origins: &[String]) -> Self {
        let mut origins = Vec::with_capacity(allowed_origins.len());
        for origin in allowed_origins {
            match HeaderValue::from_str(origin) {
                Ok(value) => origins.push(value),
                Err(err) => tracing::warn!("ignoring invalid CORS origin '{origin}': {err}"),
            }
        }
        Self { origins }
    }

    /// The request origin, if it is on the allow-list.
    pub fn allowed<'a>(&self, headers: &'a HeaderMap) -> Option<&'a HeaderValue> {
        headers
            .get(ORIGIN)
            .filter(|origin| self.origins.iter().any(|o| o == *origin))
    }

    /// Attach cross-origin headers for `origin`.
    pub fn apply(origin: HeaderValue, headers: &mut HeaderMap) {
        let _ = headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        let _ = headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        let _ = headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        let _ = headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        let _ = headers.append(VARY, HeaderValue::from_static("Origin"));
    }
}

/// Middleware applying [`CorsGate`] to every response.
pub async fn cors(State(gate): State<Arc<CorsGate>>, request: Request, next: Next) -> Response {
    let origin = gate.allowed(request.headers()).cloned();

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    if let Some(origin) = origin {
        CorsGate::apply(origin, response.headers_mut());
    }
    response
}
