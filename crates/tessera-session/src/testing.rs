//! Failure-injecting store wrapper for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::store::SessionStore;
use crate::types::SessionId;

/// Wraps a store and fails selected operations on demand.
///
/// Clones share the same switches and counters, so a test can keep a handle
/// while the session manager owns another.
#[derive(Debug, Clone)]
pub struct FaultyStore<S> {
    inner: S,
    faults: Arc<Faults>,
}

#[derive(Debug, Default)]
struct Faults {
    fail_create: AtomicBool,
    fail_get: AtomicBool,
    fail_delete: AtomicBool,
    delay_ms: AtomicU64,
    creates: AtomicUsize,
    gets: AtomicUsize,
    deletes: AtomicUsize,
}

impl<S: SessionStore> FaultyStore<S> {
    /// Wrap `inner` with all faults switched off.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Arc::new(Faults::default()),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Make `create` fail.
    pub fn fail_create(&self, on: bool) {
        self.faults.fail_create.store(on, Ordering::SeqCst);
    }

    /// Make `get` fail.
    pub fn fail_get(&self, on: bool) {
        self.faults.fail_get.store(on, Ordering::SeqCst);
    }

    /// Make `delete` fail.
    pub fn fail_delete(&self, on: bool) {
        self.faults.fail_delete.store(on, Ordering::SeqCst);
    }

    /// Delay every operation by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.faults
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of `create` calls observed, failed ones included.
    pub fn create_calls(&self) -> usize {
        self.faults.creates.load(Ordering::SeqCst)
    }

    /// Number of `get` calls observed, failed ones included.
    pub fn get_calls(&self) -> usize {
        self.faults.gets.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls observed, failed ones included.
    pub fn delete_calls(&self) -> usize {
        self.faults.deletes.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let ms = self.faults.delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

fn injected(op: &str) -> StoreError {
    StoreError::Unavailable(format!("injected {} failure", op))
}

#[async_trait]
impl<S: SessionStore> SessionStore for FaultyStore<S> {
    async fn create(&self, id: &SessionId, username: &str, ttl: Duration) -> StoreResult<()> {
        self.faults.creates.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.faults.fail_create.load(Ordering::SeqCst) {
            return Err(injected("create"));
        }
        self.inner.create(id, username, ttl).await
    }

    async fn get(&self, id: &SessionId) -> StoreResult<Option<String>> {
        self.faults.gets.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.faults.fail_get.load(Ordering::SeqCst) {
            return Err(injected("get"));
        }
        self.inner.get(id).await
    }

    async fn delete(&self, id: &SessionId) -> StoreResult<()> {
        self.faults.deletes.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.faults.fail_delete.load(Ordering::SeqCst) {
            return Err(injected("delete"));
        }
        self.inner.delete(id).await
    }

    async fn remaining_ttl(&self, id: &SessionId) -> StoreResult<Option<Duration>> {
        self.inner.remaining_ttl(id).await
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.faults.fail_get.load(Ordering::SeqCst) {
            return Err(injected("ping"));
        }
        self.inner.ping().await
    }

    fn backend(&self) -> &'static str {
        "faulty"
    }
}
