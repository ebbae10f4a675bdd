//! Storage seam for active sessions.
//!
//! The [`SessionStore`] trait decouples the session manager from the
//! TTL cache that holds active sessions. The cache is the single source of
//! truth: key = session identifier, value = username, expiry = the cache's
//! native TTL. Implementations must make each individual operation atomic;
//! no cross-key transactions are expected.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::SessionId;

/// Capability over an external TTL key-value cache.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Write `id -> username`, evicted by the backend after `ttl`.
    ///
    /// Create-only: an existing key is left untouched and
    /// [`StoreError::Conflict`](crate::StoreError::Conflict) is returned.
    async fn create(&self, id: &SessionId, username: &str, ttl: Duration) -> StoreResult<()>;

    /// Read the username bound to `id`.
    ///
    /// Returns `Ok(None)` both when the key never existed and when its TTL
    /// has lapsed.
    async fn get(&self, id: &SessionId) -> StoreResult<Option<String>>;

    /// Remove `id`. Removing an absent key is not an error.
    async fn delete(&self, id: &SessionId) -> StoreResult<()>;

    /// Remaining lifetime of `id` as tracked by the backend, if present.
    async fn remaining_ttl(&self, id: &SessionId) -> StoreResult<Option<Duration>>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Backend name for diagnostics.
    fn backend(&self) -> &'static str;
}

/// Shared handle to a store, as held by the session manager.
pub type SharedStore = Arc<dyn SessionStore>;

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    async fn create(&self, id: &SessionId, username: &str, ttl: Duration) -> StoreResult<()> {
        (**self).create(id, username, ttl).await
    }

    async fn get(&self, id: &SessionId) -> StoreResult<Option<String>> {
        (**self).get(id).await
    }

    async fn delete(&self, id: &SessionId) -> StoreResult<()> {
        (**self).delete(id).await
    }

    async fn remaining_ttl(&self, id: &SessionId) -> StoreResult<Option<Duration>> {
        (**self).remaining_ttl(id).await
    }

    async fn ping(&self) -> StoreResult<()> {
        (**self).ping().await
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}
