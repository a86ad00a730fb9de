//! Health check endpoint
//!
//! GET /health - liveness probe (server is up)

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

/// GET /health - liveness probe
///
/// Always returns 200 OK while the process is alive.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "tablegate-gateway" })),
    )
}

/// Build the health router sub-tree
pub fn health_router() -> axum::Router<AppState> {
    use axum::routing::get;
    axum::Router::new().route("/health", get(health))
}
