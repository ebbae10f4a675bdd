//! Error types for the server.
//!
//! Every failure leaves the server as `{"message": "<reason>"}`. Internal
//! detail is logged and never sent to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tessera_session::SessionError;

/// Reply to a request whose method does not match the route.
pub const WRONG_METHOD: &str = "Wrong HTTP method";

/// Reply to an undecodable login body.
pub const BAD_JSON_BODY: &str = "Bad JSON body";

/// Reply to rejected credentials.
pub const WRONG_CREDENTIALS: &str = "Wrong user or password";

/// Reply to a missing, unknown or expired session.
pub const LOGIN_REQUIRED: &str = "You need to login to get a SessionID";

/// Reply to any internal failure.
pub const INTERNAL_ERROR: &str = "Internal Server Error";

/// Reply when the session store is unreachable.
pub const STORE_UNAVAILABLE: &str = "Session store unavailable";

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A dependency is down.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SessionError> for ServerError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Unauthorized => ServerError::Unauthorized(WRONG_CREDENTIALS.to_string()),
            SessionError::Unauthenticated => ServerError::Unauthorized(LOGIN_REQUIRED.to_string()),
            SessionError::Internal(detail) => ServerError::Internal(detail),
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Body of every error response, and of the profile greeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Create a message body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            ServerError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.as_str()),
            ServerError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, STORE_UNAVAILABLE)
            }
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR),
        };

        match &self {
            ServerError::Internal(_) | ServerError::ServiceUnavailable(_) => {
                tracing::error!(status = %status, error = %self, "Server error");
            }
            _ => {
                tracing::debug!(status = %status, error = %self, "Client error");
            }
        }

        (status, Json(MessageResponse::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ServerError) -> (StatusCode, MessageResponse) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_leaked() {
        let (status, body) =
            body_of(ServerError::Internal("redis: connection refused".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal Server Error");
    }

    #[tokio::test]
    async fn test_session_errors_map_to_401() {
        let (status, body) = body_of(SessionError::Unauthorized.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.message, WRONG_CREDENTIALS);

        let (status, body) = body_of(SessionError::Unauthenticated.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.message, LOGIN_REQUIRED);
    }

    #[tokio::test]
    async fn test_bad_request_carries_message() {
        let (status, body) = body_of(ServerError::BadRequest(WRONG_METHOD.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, WRONG_METHOD);
    }
}
