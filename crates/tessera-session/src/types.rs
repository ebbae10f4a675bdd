//! Session data types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque session identifier.
///
/// Generated identifiers are random UUIDv4 strings. Identifiers received from
/// clients are accepted verbatim and only ever used as store keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Mint a fresh, unguessable identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short prefix suitable for log fields.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A claimed username/password pair.
///
/// Missing fields decode as empty strings so that they fail verification
/// rather than decoding.
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    /// Claimed principal.
    #[serde(default)]
    pub username: String,
    /// Claimed password.
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// Create a credentials pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One active authenticated period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Bearer identifier for this session.
    #[serde(rename = "sessionID")]
    pub session_id: SessionId,

    /// Principal the session authenticates. Never sent on the wire.
    #[serde(skip)]
    pub username: String,

    /// Unix timestamp (seconds) after which the session is gone.
    /// Informational; the store's own TTL is authoritative.
    pub expiration: i64,

    /// Server instance that issued the session.
    pub origin: String,
}

/// State of a session identifier as observed through the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Key present and unexpired.
    Active,
    /// Key missing or expired. The two are indistinguishable.
    Absent,
}
