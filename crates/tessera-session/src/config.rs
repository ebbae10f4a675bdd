//! Lifecycle policy for issued sessions.

use std::time::Duration;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(120);

/// Default upper bound for a single store round trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Origin reported when the host name cannot be determined.
pub const FALLBACK_ORIGIN: &str = "NoHostName";

/// Policy applied by the session manager to every issued session.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// Lifetime of every session, fixed at creation.
    /// Rotation mints a fresh full-length window with the same value.
    pub ttl: Duration,

    /// Identifies the server instance that issued a session (diagnostic only).
    pub origin: String,

    /// Bound applied to each store call. An elapsed bound is a store failure.
    pub store_timeout: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_SESSION_TTL,
            origin: default_origin(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl SessionPolicy {
    /// Create a new policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the origin reported in issued sessions.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the per-call store timeout.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}

/// Host name of the current machine, or [`FALLBACK_ORIGIN`].
pub fn default_origin() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| FALLBACK_ORIGIN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults() {
        let policy = SessionPolicy::default();
        assert_eq!(policy.ttl, Duration::from_secs(120));
        assert_eq!(policy.store_timeout, Duration::from_secs(2));
        assert!(!policy.origin.is_empty());
    }

    #[test]
    fn test_policy_builder() {
        let policy = SessionPolicy::new()
            .with_ttl(Duration::from_secs(180))
            .with_origin("api-1")
            .with_store_timeout(Duration::from_millis(250));

        assert_eq!(policy.ttl, Duration::from_secs(180));
        assert_eq!(policy.origin, "api-1");
        assert_eq!(policy.store_timeout, Duration::from_millis(250));
    }
}
