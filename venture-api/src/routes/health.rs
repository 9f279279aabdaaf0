//! Health check endpoint.

use axum::{extract::State, response::IntoResponse, Json};

use crate::state::AppState;
use crate::types::HealthResponse;

/// GET /health - Liveness probe with uptime.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
