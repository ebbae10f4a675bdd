//! Health check endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Session store backend.
    pub store: String,
}

/// GET /health - reports ok when the session store answers.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ServerError> {
    state
        .sessions
        .check_store()
        .await
        .map_err(|e| ServerError::ServiceUnavailable(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: state.sessions.backend().to_string(),
    }))
}

/// Create health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
