//! HTTP surface.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /data/search` | [`handlers::search`] |
//! | `POST /data/upload` | [`handlers::upload`] (multipart, field `file`) |
//! | `GET /health` | [`handlers::health`] |
//!
//! Errors are returned as `{ "error": string }` (see [`ApiError`]).

pub mod error;
pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::ingestion::IngestionPipeline;
use crate::query::QueryEngine;
use crate::store::CsvStore;

pub use error::ApiError;
pub use handlers::UploadResponse;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub queries: QueryEngine,
    pub pipeline: IngestionPipeline,
    pub upload_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(store: Arc<dyn CsvStore>, config: &Config) -> Self {
        Self {
            queries: QueryEngine::new(store.clone()),
            pipeline: IngestionPipeline::new(store, config.ingestion_options()),
            upload_dir: Arc::new(config.upload_dir()),
        }
    }
}

/// Build the application router over `store`.
pub fn router(store: Arc<dyn CsvStore>, config: &Config) -> Router {
    let state = AppState::new(store, config);

    Router::new()
        .route("/data/search", get(handlers::search))
        .route("/data/upload", post(handlers::upload))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(%origin, error = %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
