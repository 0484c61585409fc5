//! emogo-api: collects mood, location and video-reference logs and
//! re-exports them as filtered JSON views.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod export;
pub mod handlers;
pub mod models;
pub mod schema;
pub mod store;

use config::Config;
use store::LogStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LogStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().route("/api/logs", post(handlers::logs::create_log));

    let export_routes = Router::new()
        .route("/export", get(handlers::export::export_index))
        .route(
            "/export/sentiments",
            get(handlers::export::export_sentiments),
        )
        .route("/export/gps", get(handlers::export::export_gps))
        .route("/export/vlogs", get(handlers::export::export_vlogs));

    let health_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    Router::new()
        .merge(api_routes)
        .merge(export_routes)
        .merge(health_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin when none are configured, otherwise exactly the listed ones.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if config.cors_allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}
