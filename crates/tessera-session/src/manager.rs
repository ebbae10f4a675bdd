//! Session lifecycle: issuance, validation and rotation.
//!
//! A session identifier is either `Active` (key present in the store and
//! unexpired) or `Absent` (missing or expired, indistinguishable). The
//! manager keeps no session state of its own; everything lives in the store,
//! and correctness rests on the atomicity of single-key store operations.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::SessionPolicy;
use crate::error::{Result, SessionError, StoreError, StoreResult};
use crate::store::{SessionStore, SharedStore};
use crate::types::{Credentials, Session, SessionId, SessionState};
use crate::verifier::CredentialVerifier;

/// Orchestrates the session lifecycle over a verifier and a store.
///
/// Cloning is cheap; clones share the verifier, store and policy.
#[derive(Clone)]
pub struct SessionManager {
    verifier: Arc<dyn CredentialVerifier>,
    store: SharedStore,
    policy: Arc<SessionPolicy>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("store", &self.store.backend())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager that owns its verifier and store.
    pub fn new<V, S>(verifier: V, store: S, policy: SessionPolicy) -> Self
    where
        V: CredentialVerifier + 'static,
        S: SessionStore + 'static,
    {
        Self::from_shared(Arc::new(verifier), Arc::new(store), policy)
    }

    /// Create a manager over already-shared collaborators.
    pub fn from_shared(
        verifier: Arc<dyn CredentialVerifier>,
        store: SharedStore,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            verifier,
            store,
            policy: Arc::new(policy),
        }
    }

    /// The policy applied to issued sessions.
    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Name of the backing store.
    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Verify credentials and open a new session for the principal.
    ///
    /// Rejected credentials never touch the store.
    pub async fn issue(&self, credentials: &Credentials) -> Result<Session> {
        if !self
            .verifier
            .verify(&credentials.username, &credentials.password)
        {
            warn!(username = %credentials.username, "Rejected login attempt");
            return Err(SessionError::Unauthorized);
        }

        let session = self.open(&credentials.username).await?;
        info!(
            username = %session.username,
            session = %session.session_id.short(),
            expiration = session.expiration,
            "Issued session"
        );
        Ok(session)
    }

    /// Resolve a session identifier to its principal.
    ///
    /// Has no effect on the session's remaining lifetime. Empty identifiers
    /// are rejected without a store call.
    pub async fn validate(&self, id: &SessionId) -> Result<String> {
        if id.is_empty() {
            return Err(SessionError::Unauthenticated);
        }

        match self.bounded(self.store.get(id)).await {
            Ok(Some(username)) => {
                debug!(session = %id.short(), username = %username, "Session resolved");
                Ok(username)
            }
            Ok(None) => {
                debug!(session = %id.short(), "Session absent or expired");
                Err(SessionError::Unauthenticated)
            }
            Err(e) => Err(self.fatal("get", e)),
        }
    }

    /// Replace a session identifier with a fresh one for the same principal.
    ///
    /// The new session is created before the old one is deleted, so a store
    /// failure mid-way never leaves the principal without a valid session.
    /// The sequence runs in its own task and completes even if the caller
    /// stops waiting for it.
    pub async fn rotate(&self, id: &SessionId) -> Result<Session> {
        if id.is_empty() {
            return Err(SessionError::Unauthenticated);
        }

        let manager = self.clone();
        let old = id.clone();
        tokio::spawn(async move { manager.rotate_to_completion(&old).await })
            .await
            .map_err(|e| {
                error!(error = %e, "Rotation task did not complete");
                SessionError::Internal(format!("rotation task failed: {}", e))
            })?
    }

    async fn rotate_to_completion(&self, old: &SessionId) -> Result<Session> {
        let username = self.validate(old).await?;

        // The old identifier stays valid if this fails.
        let session = self.open(&username).await?;

        if let Err(e) = self.bounded(self.store.delete(old)).await {
            warn!(
                backend = self.store.backend(),
                session = %old.short(),
                error = %e,
                "Old session not deleted after rotation; it remains valid until its TTL lapses"
            );
        }

        info!(
            username = %username,
            old_session = %old.short(),
            session = %session.session_id.short(),
            "Rotated session"
        );
        Ok(session)
    }

    /// Observe a session identifier through the store.
    pub async fn state(&self, id: &SessionId) -> Result<SessionState> {
        match self.validate(id).await {
            Ok(_) => Ok(SessionState::Active),
            Err(SessionError::Unauthenticated) => Ok(SessionState::Absent),
            Err(e) => Err(e),
        }
    }

    /// Remaining lifetime of a session as tracked by the store.
    pub async fn remaining_ttl(&self, id: &SessionId) -> Result<Option<Duration>> {
        if id.is_empty() {
            return Ok(None);
        }
        self.bounded(self.store.remaining_ttl(id))
            .await
            .map_err(|e| self.fatal("remaining_ttl", e))
    }

    /// Check that the backing store answers within the store timeout.
    pub async fn check_store(&self) -> Result<()> {
        self.bounded(self.store.ping())
            .await
            .map_err(|e| self.fatal("ping", e))
    }

    async fn open(&self, username: &str) -> Result<Session> {
        let id = SessionId::generate();
        let ttl = self.policy.ttl;
        let expiration = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| Utc::now().timestamp().checked_add(secs))
            .ok_or_else(|| SessionError::Internal(format!("ttl {:?} out of range", ttl)))?;

        self.bounded(self.store.create(&id, username, ttl))
            .await
            .map_err(|e| self.fatal("create", e))?;

        Ok(Session {
            session_id: id,
            username: username.to_string(),
            expiration,
            origin: self.policy.origin.clone(),
        })
    }

    async fn bounded<T>(&self, op: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        let limit = self.policy.store_timeout;
        tokio::time::timeout(limit, op)
            .await
            .unwrap_or(Err(StoreError::Timeout(limit)))
    }

    fn fatal(&self, op: &'static str, e: StoreError) -> SessionError {
        error!(backend = self.store.backend(), op, error = %e, "Session store call failed");
        SessionError::from(e)
    }
}
