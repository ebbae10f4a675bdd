//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [server]                 # listener settings
//! [store]                  # session store connection
//! [session]                # lifetime policy
//! [users]                  # identity table: username = "password"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind address.
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Default Redis host.
pub const DEFAULT_REDIS_HOST: &str = "localhost";

/// Default Redis port.
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Default session lifetime in seconds.
pub const DEFAULT_TTL_SECS: u64 = 120;

/// Longest accepted session lifetime (30 days), in seconds.
pub const MAX_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Default bound for a single store call, in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;

/// Default purge interval for the in-memory store, in seconds.
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Redis host override.
pub const REDIS_HOSTNAME_ENV: &str = "REDIS_HOSTNAME";

/// Redis port override.
pub const REDIS_PORT_ENV: &str = "REDIS_PORT";

/// Full Redis URL override; wins over host and port.
pub const REDIS_URL_ENV: &str = "REDIS_URL";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseraConfig {
    /// Listener configuration.
    pub server: Option<ServerConfig>,

    /// Session store configuration.
    pub store: Option<StoreConfig>,

    /// Session lifetime configuration.
    pub session: Option<SessionConfig>,

    /// Identity table. `None` means the built-in demo principals.
    pub users: Option<BTreeMap<String, String>>,
}

impl TesseraConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: TesseraConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }

        if other.store.is_some() {
            self.store = other.store;
        }

        if other.session.is_some() {
            self.session = other.session;
        }

        if let Some(users) = other.users {
            self.users.get_or_insert_with(BTreeMap::new).extend(users);
        }
    }

    /// Server section, or defaults.
    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// Store section, or defaults.
    pub fn store(&self) -> StoreConfig {
        self.store.clone().unwrap_or_default()
    }

    /// Session section, or defaults.
    pub fn session(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }

    /// Apply `REDIS_HOSTNAME`, `REDIS_PORT` and `REDIS_URL` from the process
    /// environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply store overrides using `lookup` to read variables.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let host = value(REDIS_HOSTNAME_ENV);
        let port = value(REDIS_PORT_ENV);
        let url = value(REDIS_URL_ENV);

        if host.is_none() && port.is_none() && url.is_none() {
            return Ok(());
        }

        let store = self.store.get_or_insert_with(StoreConfig::default);
        if let Some(host) = host {
            store.host = host;
        }
        if let Some(port) = port {
            store.port = port
                .parse()
                .map_err(|_| ConfigError::invalid(REDIS_PORT_ENV, format!("'{}' is not a port", port)))?;
        }
        if let Some(url) = url {
            store.url = Some(url);
        }
        Ok(())
    }

    /// Check that the merged configuration is usable.
    pub fn validate(&self) -> Result<()> {
        let session = self.session();
        if session.ttl_secs == 0 {
            return Err(ConfigError::invalid("session.ttl_secs", "must be greater than zero"));
        }
        if session.ttl_secs > MAX_TTL_SECS {
            return Err(ConfigError::invalid(
                "session.ttl_secs",
                format!("must be at most {}", MAX_TTL_SECS),
            ));
        }

        let store = self.store();
        if store.timeout_ms == 0 {
            return Err(ConfigError::invalid("store.timeout_ms", "must be greater than zero"));
        }
        if store.port == 0 {
            return Err(ConfigError::invalid("store.port", "must be greater than zero"));
        }
        if store.backend == StoreBackend::Memory && store.cleanup_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "store.cleanup_interval_secs",
                "must be greater than zero",
            ));
        }
        if let Some(url) = &store.url
            && !url.starts_with("redis://")
            && !url.starts_with("rediss://")
        {
            return Err(ConfigError::invalid("store.url", "expected a redis:// URL"));
        }

        if let Some(users) = &self.users
            && users.keys().any(|u| u.is_empty())
        {
            return Err(ConfigError::invalid("users", "usernames must not be empty"));
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub bind: String,
    /// Enable request logging.
    pub request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            request_logging: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Which session store backs the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// External Redis server.
    #[default]
    Redis,
    /// In-process map; sessions do not survive a restart.
    Memory,
}

/// Session store configuration.
///
/// ```toml
/// [store]
/// backend = "redis"
/// host = "localhost"
/// port = 6379
/// timeout_ms = 2000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store backend.
    pub backend: StoreBackend,
    /// Redis host.
    pub host: String,
    /// Redis port.
    pub port: u16,
    /// Full connection URL; overrides `host` and `port` when set.
    pub url: Option<String>,
    /// Bound for a single store call, in milliseconds.
    pub timeout_ms: u64,
    /// Purge interval for the memory backend, in seconds.
    pub cleanup_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redis,
            host: DEFAULT_REDIS_HOST.to_string(),
            port: DEFAULT_REDIS_PORT,
            url: None,
            timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
        }
    }
}

impl StoreConfig {
    /// Connection URL for the Redis backend.
    pub fn redis_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("redis://{}:{}", self.host, self.port),
        }
    }

    /// Per-call timeout.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    /// Purge interval for the memory backend.
    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cleanup_interval_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Session lifetime configuration.
///
/// ```toml
/// [session]
/// ttl_secs = 120
/// origin = "api-eu-1"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lifetime of every issued session, in seconds.
    pub ttl_secs: u64,
    /// Origin reported in issued sessions. Defaults to the host name.
    pub origin: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
            origin: None,
        }
    }
}

impl SessionConfig {
    /// Session lifetime.
    pub fn ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TesseraConfig::from_toml("").unwrap();
        assert!(config.server.is_none());
        assert_eq!(config.server().port, 8080);
        assert_eq!(config.store().backend, StoreBackend::Redis);
        assert_eq!(config.store().redis_url(), "redis://localhost:6379");
        assert_eq!(config.session().ttl_secs, 120);
        assert!(config.users.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let config = TesseraConfig::from_toml(
            r#"
[server]
port = 9000
bind = "127.0.0.1"
request_logging = false

[store]
backend = "memory"
timeout_ms = 500

[session]
ttl_secs = 180
origin = "api-1"

[users]
Hugo = "Hugo123"
"#,
        )
        .unwrap();

        assert_eq!(config.server().port, 9000);
        assert!(!config.server().request_logging);
        assert_eq!(config.store().backend, StoreBackend::Memory);
        assert_eq!(config.store().timeout(), std::time::Duration::from_millis(500));
        assert_eq!(config.session().ttl(), std::time::Duration::from_secs(180));
        assert_eq!(config.session().origin.as_deref(), Some("api-1"));
        assert_eq!(config.users.as_ref().unwrap()["Hugo"], "Hugo123");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = TesseraConfig::from_toml("[store]\nbackend = \"memcached\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_merge_section_override_and_user_union() {
        let mut base = TesseraConfig::from_toml(
            r#"
[server]
port = 8080

[session]
ttl_secs = 120

[users]
Hugo = "Hugo123"
"#,
        )
        .unwrap();

        let overlay = TesseraConfig::from_toml(
            r#"
[server]
port = 3000

[users]
Paco = "Paco123"
"#,
        )
        .unwrap();

        base.merge(overlay);

        assert_eq!(base.server().port, 3000);
        assert_eq!(base.session().ttl_secs, 120);
        let users = base.users.unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.contains_key("Hugo"));
        assert!(users.contains_key("Paco"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            [("REDIS_HOSTNAME", "cache.internal"), ("REDIS_PORT", "6380")].into();
        let mut config = TesseraConfig::new();

        config
            .apply_env_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.store().redis_url(), "redis://cache.internal:6380");
    }

    #[test]
    fn test_env_url_wins() {
        let env: HashMap<&str, &str> = [
            ("REDIS_HOSTNAME", "ignored"),
            ("REDIS_URL", "redis://10.0.0.5:7000/2"),
        ]
        .into();
        let mut config = TesseraConfig::new();

        config
            .apply_env_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.store().redis_url(), "redis://10.0.0.5:7000/2");
    }

    #[test]
    fn test_env_bad_port() {
        let mut config = TesseraConfig::new();
        let err = config
            .apply_env_from(|k| (k == "REDIS_PORT").then(|| "sixty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_env_absent_leaves_config_untouched() {
        let mut config = TesseraConfig::new();
        config.apply_env_from(|_| None).unwrap();
        assert!(config.store.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = TesseraConfig::from_toml("[session]\nttl_secs = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("session.ttl_secs"));
    }

    #[test]
    fn test_validate_caps_ttl() {
        let mut config = TesseraConfig::from_toml("[session]\nttl_secs = 9223372036854775807\n")
            .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at most"));

        config.session.as_mut().unwrap().ttl_secs = MAX_TTL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_redis_url() {
        let config = TesseraConfig::from_toml("[store]\nurl = \"http://localhost\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip_preserves_sections() {
        let config = TesseraConfig::from_toml("[session]\nttl_secs = 180\n").unwrap();
        let reparsed = TesseraConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, reparsed);
    }
}
