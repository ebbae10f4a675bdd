//! Error types for session lifecycle operations.

use std::time::Duration;

/// Error type for session lifecycle operations.
///
/// This is the closed set of outcomes the [`SessionManager`](crate::SessionManager)
/// reports besides success. Callers map each variant to a wire response.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The presented credentials did not match the identity store.
    #[error("wrong user or password")]
    Unauthorized,

    /// The session identifier is empty, unknown or expired.
    #[error("login required")]
    Unauthenticated,

    /// The backing store failed or the operation could not complete.
    ///
    /// The payload is operator-facing detail and must not reach clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        SessionError::Internal(e.to_string())
    }
}

/// Result type for session lifecycle operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Error type for session store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing cache could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The operation did not finish within the configured bound.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    /// A create targeted a key that already exists.
    #[error("session key already exists: {0}")]
    Conflict(String),

    /// The backing cache answered with an error.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() {
            StoreError::Unavailable(e.to_string())
        } else if e.is_timeout() {
            StoreError::Backend(format!("redis timeout: {}", e))
        } else {
            StoreError::Backend(e.to_string())
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
