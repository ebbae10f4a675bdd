//! In-process TTL store.
//!
//! Used for development mode and tests. Entries expire lazily when read and
//! eagerly through [`MemoryStore::purge_expired`], which the optional
//! background task calls on an interval.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::{StoreError, StoreResult};
use crate::store::SessionStore;
use crate::types::SessionId;

/// Default interval for the background purge task.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct Entry {
    username: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// TTL key-value store held in process memory.
///
/// Cloning shares the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held, including expired keys not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Remove every expired entry and return how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Spawn a background task that purges expired entries every `interval`.
    ///
    /// Returns a `JoinHandle` that can be used to abort the task.
    pub fn spawn_cleanup_task(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let purged = store.purge_expired().await;
                if purged > 0 {
                    debug!(purged, "Memory store cleanup completed");
                } else {
                    trace!("Memory store cleanup: nothing expired");
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, id: &SessionId, username: &str, ttl: Duration) -> StoreResult<()> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| StoreError::Backend(format!("ttl {:?} out of range", ttl)))?;
        let mut entries = self.entries.write().await;

        if let Some(existing) = entries.get(id.as_str())
            && !existing.is_expired(now)
        {
            return Err(StoreError::Conflict(id.short().to_string()));
        }

        entries.insert(
            id.as_str().to_string(),
            Entry {
                username: username.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> StoreResult<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(id.as_str()) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.username.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it so it can never be observed again.
        let mut entries = self.entries.write().await;
        if entries
            .get(id.as_str())
            .is_some_and(|entry| entry.is_expired(now))
        {
            entries.remove(id.as_str());
        }
        Ok(None)
    }

    async fn delete(&self, id: &SessionId) -> StoreResult<()> {
        self.entries.write().await.remove(id.as_str());
        Ok(())
    }

    async fn remaining_ttl(&self, id: &SessionId) -> StoreResult<Option<Duration>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(id.as_str())
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.expires_at.saturating_duration_since(now)))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
