//! Session endpoints: login, profile and refresh.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::debug;

use tessera_session::{Credentials, Session, SessionId};

use crate::error::{BAD_JSON_BODY, MessageResponse, ServerError, WRONG_METHOD};
use crate::state::AppState;

/// Header carrying the session identifier.
pub const SESSION_ID_HEADER: &str = "SessionID";

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /login - Exchange credentials for a new session.
///
/// The body is decoded as JSON whatever `Content-Type` says, so plain
/// `curl -d` clients work.
pub async fn login_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Session>), ServerError> {
    let credentials: Credentials = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "Rejected login body");
        ServerError::BadRequest(BAD_JSON_BODY.to_string())
    })?;

    let session = state.sessions.issue(&credentials).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /profile - Greet the principal behind the `SessionID` header.
pub async fn profile_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ServerError> {
    let id = session_id_from(&headers);
    let username = state.sessions.validate(&id).await?;
    Ok(Json(MessageResponse::new(format!("Hi {}!", username))))
}

/// POST /refresh - Rotate the session in the `SessionID` header.
pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Session>), ServerError> {
    let id = session_id_from(&headers);
    let session = state.sessions.rotate(&id).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Fallback for a known path requested with the wrong method.
pub async fn wrong_method_handler() -> ServerError {
    ServerError::BadRequest(WRONG_METHOD.to_string())
}

/// Read the session identifier header.
///
/// A missing or non-UTF-8 header reads as empty, which the session manager
/// rejects without a store call.
fn session_id_from(headers: &HeaderMap) -> SessionId {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(SessionId::from)
        .unwrap_or_else(|| SessionId::from(""))
}
