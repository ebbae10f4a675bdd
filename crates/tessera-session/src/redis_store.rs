//! Redis-backed session store.
//!
//! Key = session identifier, value = username, expiry = Redis' native key
//! TTL. Each operation is a single Redis command and therefore atomic.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::store::SessionStore;
use crate::types::SessionId;

/// Session store over a Redis connection manager.
///
/// The connection manager multiplexes commands from concurrent requests over
/// one connection and reconnects on failure; cloning the store is cheap.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to the Redis server at `url` (e.g. `redis://localhost:6379`).
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url '{}': {}", url, e)))?;
        let conn = ConnectionManager::new(client).await?;
        info!(url = %url, "Connected to redis session store");
        Ok(Self { conn })
    }

    /// Wrap an existing connection manager.
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn create(&self, id: &SessionId, username: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let ttl_ms = ttl.as_millis().clamp(1, u64::MAX as u128) as u64;

        // SET NX answers nil when the key already exists.
        let reply: Option<String> = redis::cmd("SET")
            .arg(id.as_str())
            .arg(username)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;

        match reply {
            Some(_) => {
                debug!(session = %id.short(), ttl_ms, "Stored session");
                Ok(())
            }
            None => Err(StoreError::Conflict(id.short().to_string())),
        }
    }

    async fn get(&self, id: &SessionId) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let username: Option<String> = conn.get(id.as_str()).await?;
        Ok(username)
    }

    async fn delete(&self, id: &SessionId) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(id.as_str()).await?;
        debug!(session = %id.short(), removed, "Deleted session");
        Ok(())
    }

    async fn remaining_ttl(&self, id: &SessionId) -> StoreResult<Option<Duration>> {
        let mut conn = self.conn.clone();
        // -2: no such key, -1: key without expiry (never written by us).
        let ms: i64 = redis::cmd("PTTL")
            .arg(id.as_str())
            .query_async(&mut conn)
            .await?;
        Ok(u64::try_from(ms).ok().map(Duration::from_millis))
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    //! These tests need a live Redis and run only when
    //! `TESSERA_TEST_REDIS_URL` is set.

    use super::*;

    async fn test_store() -> Option<RedisStore> {
        let url = std::env::var("TESSERA_TEST_REDIS_URL").ok()?;
        Some(RedisStore::connect(&url).await.unwrap())
    }

    #[tokio::test]
    async fn test_redis_lifecycle() {
        let Some(store) = test_store().await else {
            return;
        };
        let id = SessionId::generate();

        store.create(&id, "Hugo", Duration::from_secs(30)).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), Some("Hugo".to_string()));

        let ttl = store.remaining_ttl(&id).await.unwrap().unwrap();
        assert!(ttl <= Duration::from_secs(30));

        store.delete(&id).await.unwrap();
        store.delete(&id).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), None);
        assert_eq!(store.remaining_ttl(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_redis_create_is_create_only() {
        let Some(store) = test_store().await else {
            return;
        };
        let id = SessionId::generate();

        store.create(&id, "Hugo", Duration::from_secs(30)).await.unwrap();
        let err = store.create(&id, "Paco", Duration::from_secs(30)).await;
        assert!(matches!(err, Err(StoreError::Conflict(_))));
        assert_eq!(store.get(&id).await.unwrap(), Some("Hugo".to_string()));

        store.delete(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_redis_expiry() {
        let Some(store) = test_store().await else {
            return;
        };
        let id = SessionId::generate();

        store.create(&id, "Hugo", Duration::from_millis(50)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(store.get(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_redis_ping() {
        let Some(store) = test_store().await else {
            return;
        };
        store.ping().await.unwrap();
        assert_eq!(store.backend(), "redis");
    }
}
