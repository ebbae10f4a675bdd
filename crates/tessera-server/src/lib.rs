//! HTTP API for the Tessera session service.
//!
//! This crate is the network boundary in front of the session lifecycle
//! engine. It translates requests into [`SessionManager`] calls and their
//! outcomes into JSON responses.
//!
//! | Route | Method | Success |
//! |---|---|---|
//! | `/login` | POST, JSON `{username, password}` | 201 `{sessionID, expiration, origin}` |
//! | `/profile` | GET, header `SessionID` | 200 `{message: "Hi <username>!"}` |
//! | `/refresh` | POST, header `SessionID` | 201 `{sessionID, expiration, origin}` |
//! | `/health` | GET | 200 `{status, version, store}` |
//!
//! # Example
//!
//! ```ignore
//! use tessera_server::{Server, ServerConfig};
//! use tessera_session::{RedisStore, SessionManager, SessionPolicy, StaticVerifier};
//!
//! let store = RedisStore::connect("redis://localhost:6379").await?;
//! let sessions = SessionManager::new(StaticVerifier::demo(), store, SessionPolicy::default());
//! let server = Server::new(sessions, ServerConfig::new());
//! server.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{MessageResponse, Result, ServerError};
pub use logging::request_logging_middleware;
pub use state::AppState;

use std::net::SocketAddr;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tessera_session::SessionManager;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The Tessera HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server over the given session manager.
    pub fn new(sessions: SessionManager, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(sessions, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::health_routes())
            .route(
                "/login",
                post(routes::login_handler).fallback(routes::wrong_method_handler),
            )
            .route(
                "/profile",
                get(routes::profile_handler)
                    .head(routes::wrong_method_handler)
                    .fallback(routes::wrong_method_handler),
            )
            .route(
                "/refresh",
                post(routes::refresh_handler).fallback(routes::wrong_method_handler),
            )
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server on the configured address until Ctrl-C or SIGTERM.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config().bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener until Ctrl-C or SIGTERM.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let router = self.router();
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(format!("Listener has no address: {}", e)))?;

        info!(
            addr = %addr,
            store = self.state.sessions.backend(),
            ttl_secs = self.state.sessions.policy().ttl.as_secs(),
            "Starting server"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config().bind_address
    }
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
