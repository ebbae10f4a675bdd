//! Application state shared across handlers.

use std::sync::Arc;

use tessera_session::SessionManager;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
///
/// Holds no session data itself; the session manager delegates all state to
/// its store.
#[derive(Clone)]
pub struct AppState {
    /// Session lifecycle engine.
    pub sessions: SessionManager,

    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(sessions: SessionManager, config: ServerConfig) -> Self {
        Self {
            sessions,
            config: Arc::new(config),
        }
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
