//! Session lifecycle engine.
//!
//! This crate issues, validates and rotates short-lived session identifiers
//! backed by a TTL key-value cache:
//! - [`SessionManager`] owns the lifecycle rules
//! - [`CredentialVerifier`] checks claimed credentials
//! - [`SessionStore`] is the seam over the cache ([`RedisStore`], [`MemoryStore`])
//!
//! # Example
//!
//! ```rust,ignore
//! use tessera_session::{Credentials, MemoryStore, SessionManager, SessionPolicy, StaticVerifier};
//!
//! let manager = SessionManager::new(StaticVerifier::demo(), MemoryStore::new(), SessionPolicy::default());
//! let session = manager.issue(&Credentials::new("Hugo", "Hugo123")).await?;
//! let username = manager.validate(&session.session_id).await?;
//! let rotated = manager.rotate(&session.session_id).await?;
//! ```

mod config;
mod error;
mod manager;
mod memory;
mod redis_store;
mod store;
mod types;
mod verifier;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{
    DEFAULT_SESSION_TTL, DEFAULT_STORE_TIMEOUT, FALLBACK_ORIGIN, SessionPolicy, default_origin,
};
pub use error::{Result, SessionError, StoreError, StoreResult};
pub use manager::SessionManager;
pub use memory::{DEFAULT_CLEANUP_INTERVAL, MemoryStore};
pub use redis_store::RedisStore;
pub use store::{SessionStore, SharedStore};
pub use types::{Credentials, Session, SessionId, SessionState};
pub use verifier::{CredentialVerifier, StaticVerifier, demo_users};
