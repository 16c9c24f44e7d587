//! `TaskerServer`: wires the store, middleware, and routes into an Axum app.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use tasker_core::TaskStore;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::LatencyUnit;
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, error, info};

use crate::config::ServerConfig;
use crate::cors::{self, CorsGate};
use crate::rate_limit::{self, RateLimiter};
use crate::routes;
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Task persistence.
    pub store: Arc<dyn TaskStore>,
}

/// The task API server.
pub struct TaskerServer {
    config: ServerConfig,
    store: Arc<dyn TaskStore>,
    cors: Arc<CorsGate>,
    limiter: Option<Arc<RateLimiter>>,
    shutdown: Arc<ShutdownCoordinator>,
}

impl TaskerServer {
    /// Create a server over `store`. Nothing is bound until [`listen`](Self::listen).
    pub fn new(config: ServerConfig, store: Arc<dyn TaskStore>) -> Self {
        let cors = Arc::new(CorsGate::new(&config.allowed_origins));
        let limiter = config
            .rate_limit_enabled
            .then(|| Arc::new(RateLimiter::from_config(&config)));
        Self {
            config,
            store,
            cors,
            limiter,
            shutdown: Arc::new(ShutdownCoordinator::new()),
        }
    }

    /// Build the Axum router: trace and access log, then rate limiter, then
    /// CORS gate, then routes.
    pub fn router(&self) -> Router {
        let mut app = routes::router().layer(middleware::from_fn_with_state(
            Arc::clone(&self.cors),
            cors::cors,
        ));
        if let Some(limiter) = &self.limiter {
            app = app.layer(middleware::from_fn_with_state(
                Arc::clone(limiter),
                rate_limit::rate_limit,
            ));
        }
        app.layer(middleware::from_fn(access_log))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::DEBUG)
                            .latency_unit(LatencyUnit::Millis),
                    ),
            )
            .with_state(AppState {
                store: Arc::clone(&self.store),
            })
    }

    /// The router behind trailing-slash normalisation, so `/tasks/` and
    /// `//tasks` route like `/tasks`.
    ///
    /// Normalisation has to wrap the router from outside: a layer added with
    /// `Router::layer` only runs after a route has been matched.
    pub fn app(&self) -> NormalizePath<Router> {
        NormalizePath::trim_trailing_slash(self.router())
    }

    /// Bind the configured address and start serving in the background.
    ///
    /// Both the listener task and the rate limiter sweeper stop when the
    /// [`shutdown`](Self::shutdown) coordinator fires.
    pub async fn listen(&self) -> std::io::Result<ServerHandle> {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;
        let app = self.app();
        let token = self.shutdown.token();

        let serve_token = token.clone();
        let server = tokio::spawn(async move {
            let result = axum::serve(
                listener,
                axum::ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(
                    app,
                ),
            )
            .with_graceful_shutdown(async move { serve_token.cancelled().await })
            .await;
            if let Err(e) = result {
                error!(error = %e, "server error");
            }
        });
        let mut tasks = vec![server];

        if let Some(limiter) = &self.limiter {
            let limiter = Arc::clone(limiter);
            let period = Duration::from_secs(self.config.rate_limit_sweep_secs.max(1));
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        () = token.cancelled() => break,
                        now = ticker.tick() => {
                            limiter.sweep(now.into_std());
                            debug!(clients = limiter.tracked_clients(), "rate limit buckets swept");
                        }
                    }
                }
            }));
        }

        info!(
            %addr,
            backend = self.store.backend(),
            rate_limit = self.limiter.is_some(),
            "tasker listening"
        );
        Ok(ServerHandle { addr, tasks })
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// One `METHOD URI => STATUS (Nms)` line per request.
async fn access_log(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        target: "tasker::access",
        "{method} {uri} => {} ({}ms)",
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

/// A running server.
pub struct ServerHandle {
    addr: SocketAddr,
    tasks: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    /// Address actually bound (resolves port `0`).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Background tasks to hand to [`ShutdownCoordinator::graceful_shutdown`].
    pub fn into_tasks(self) -> Vec<JoinHandle<()>> {
        self.tasks
    }
}
