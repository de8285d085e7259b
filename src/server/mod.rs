//! HTTP shell around the override API
//!
//! | route                       | response                                |
//! |-----------------------------|-----------------------------------------|
//! | `GET /`                     | HTML status page                        |
//! | `GET /style.css`            | stylesheet                              |
//! | `GET /isactive`             | `true` / `false`                        |
//! | `GET /islocked`             | `true` / `false`                        |
//! | `GET,POST /lock/<s>/<min>`  | override, then redirect to `/`          |
//! | `GET /api/status`           | JSON status                             |
//! | `GET /health`               | JSON liveness                           |

pub mod dashboard;
pub mod handlers;
pub mod models;

use crate::climate::overrides::OverrideApi;
use crate::climate::policy::ThresholdPolicy;
use crate::config::HttpConfig;
use crate::error::{ClimateError, Result};
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use models::{HealthResponse, StatusResponse};

/// State shared by all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub api: OverrideApi,
    pub policy: ThresholdPolicy,
}

/// Build the router. Exposed separately so tests can drive it in-process.
pub fn router(state: AppState, cors: bool) -> Router {
    let app = Router::new()
        .route("/", get(handlers::index))
        .route("/style.css", get(handlers::style))
        .route("/isactive", get(handlers::is_active))
        .route("/islocked", get(handlers::is_locked))
        .route("/lock/*path", get(handlers::lock).post(handlers::lock))
        .route("/api/status", get(handlers::api_status))
        .route("/health", get(handlers::health))
        .fallback(handlers::fallback)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// HTTP server bound to the configured address
pub struct HttpServer {
    config: HttpConfig,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: HttpConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind and serve until `shutdown` is cancelled
    pub async fn start(self, shutdown: CancellationToken) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            ClimateError::config(format!("Failed to bind to {addr}: {e}"))
        })?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
        let app = router(self.state, self.config.cors);

        info!("HTTP server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}
