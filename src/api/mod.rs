//! HTTP API
//!
//! axum router exposing analysis, optimization, health, metrics, docs and
//! the live-analysis socket.

pub mod docs;
pub mod error;
pub mod routes;
pub mod ws;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

use crate::error::{PromptAssistError, Result, ValidationError};
use crate::service::PromptService;

pub use error::ApiError;
pub use ws::LiveHub;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PromptService>,
    pub live: Arc<LiveHub>,
}

impl AppState {
    pub fn new(service: Arc<PromptService>) -> Self {
        Self {
            service,
            live: Arc::new(LiveHub::new()),
        }
    }

    fn api_error(&self, err: PromptAssistError) -> ApiError {
        ApiError::from_error(err, self.service.config().debug)
    }

    /// Unreadable request bodies are reported like any other invalid request
    fn rejected(&self, rejection: JsonRejection) -> ApiError {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        self.api_error(
            ValidationError::InvalidRequest {
                message: rejection.body_text(),
            }
            .into(),
        )
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.service.config().cors_origins);

    Router::new()
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        .route("/api/prompt/analyze", post(routes::analyze_prompt))
        .route("/api/prompt/optimize", post(routes::optimize_prompt))
        .route("/api/cache/clear", delete(routes::clear_cache))
        .route("/docs", get(routes::docs_page))
        .route("/openapi.json", get(routes::openapi))
        .route("/ws/prompt-assist", get(ws::websocket))
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(state: AppState) -> Result<()> {
    let address = state.service.config().bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!("PromptAssist API listening on http://{}", address);
    tracing::info!("Interactive docs at http://{}/docs", address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("PromptAssist API shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down PromptAssist API...");
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    // Credentials rule out wildcards, so methods and headers are mirrored.
    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    tracing::info!("-> {} {}", method, path);
    let response = next.run(request).await;
    tracing::info!(
        "<- {} {} - {} ({:.3}s)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_secs_f64()
    );

    response
}
