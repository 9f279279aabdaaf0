//! REST API Routes Module
//!
//! Route handlers organized by entity type, assembled into one router with
//! CORS and request tracing applied at the edge.

pub mod admin;
pub mod agents;
pub mod artifacts;
pub mod chat;
pub mod communications;
pub mod decisions;
pub mod health;
pub mod projects;

use std::time::Duration;

use axum::{
    http::{header, header::HeaderName, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::state::AppState;

/// Assemble the full API router.
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let cors = build_cors_layer(config);

    Router::new()
        .route("/health", get(health::health))
        .nest("/chat", chat::create_router())
        .nest("/communications", communications::create_router())
        .nest("/artifacts", artifacts::create_router())
        .nest("/projects", projects::create_router())
        .nest("/decisions", decisions::create_router())
        .nest("/admin", admin::create_router())
        .nest("/agents", agents::create_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-user-id"),
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        // Development mode: allow all origins
        tracing::info!("CORS: allowing all origins");
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        tracing::info!(origins = ?config.cors_origins, "CORS: restricting origins");
        cors.allow_origin(origins)
    }
}
