//! Application startup and lifecycle management.
//!
//! Builds the collaborators from configuration, wires the HTTP router and
//! runs the server until a shutdown signal arrives.

use crate::config::RelayConfig;
use crate::handlers;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::TextProvider;
use crate::services::{init_metrics, HistoryDb, HistoryStore};
use axum::middleware::from_fn;
use backoff::future::retry_notify;
use backoff::ExponentialBackoff;
use axum::{
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// How long lenient startup keeps retrying an unreachable store.
const STORE_PREPARE_MAX_ELAPSED: Duration = Duration::from_secs(300);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub text_provider: Arc<dyn TextProvider>,
    pub history: Arc<dyn HistoryStore>,
}

impl AppState {
    pub fn new(text_provider: Arc<dyn TextProvider>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            text_provider,
            history,
        }
    }
}

/// Build the HTTP router for the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/generate", post(handlers::generate))
        .route("/history", get(handlers::history))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route_layer(from_fn(metrics_middleware))
        .fallback(handlers::not_found)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Prepare `store`, retrying failures with `policy` until it gives up.
pub async fn prepare_store_with_retry(
    store: &dyn HistoryStore,
    policy: ExponentialBackoff,
) -> Result<(), AppError> {
    let result = retry_notify(
        policy,
        || async { store.prepare().await.map_err(backoff::Error::transient) },
        |e: AppError, wait: Duration| {
            tracing::warn!(
                retry_in_ms = wait.as_millis() as u64,
                "MongoDB not ready: {}",
                e
            );
        },
    )
    .await;

    match &result {
        Ok(()) => tracing::info!("Connected to MongoDB"),
        Err(e) => tracing::error!("MongoDB connection error: {}; giving up", e),
    }
    result
}

/// Run [`prepare_store_with_retry`] off the startup path.
///
/// Until it succeeds, persistence and history reads fail per request.
pub fn spawn_store_preparation(
    store: Arc<dyn HistoryStore>,
    policy: ExponentialBackoff,
) -> JoinHandle<Result<(), AppError>> {
    tokio::spawn(async move { prepare_store_with_retry(store.as_ref(), policy).await })
}

fn store_retry_policy() -> ExponentialBackoff {
    ExponentialBackoff {
        max_elapsed_time: Some(STORE_PREPARE_MAX_ELAPSED),
        ..Default::default()
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let db = Arc::new(HistoryDb::connect(&config.mongodb.uri, &config.mongodb.database).await?);
        if config.mongodb.fail_fast {
            db.prepare().await.map_err(|e| {
                tracing::error!("MongoDB connection error: {}", e);
                e
            })?;
            tracing::info!("Connected to MongoDB");
        }

        let gemini_config = GeminiConfig {
            api_key: config.gemini.api_key.clone(),
            model: config.gemini.model.clone(),
            api_base: config.gemini.api_base.clone(),
        };
        let text_provider: Arc<dyn TextProvider> = Arc::new(
            GeminiTextProvider::new(gemini_config)
                .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?,
        );

        tracing::info!(
            model = %config.gemini.model,
            "Initialized Gemini text provider"
        );

        init_metrics();

        let state = AppState::new(text_provider, db.clone());

        // Port 0 picks a random port (tests).
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        if !config.mongodb.fail_fast {
            spawn_store_preparation(db, store_retry_policy());
        }

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// A clone of the configured router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!("Server running on port {}", self.port);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
