//! Start command - launches the Tessera server.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;

use tessera_config::{LoadedConfig, StoreBackend, TesseraConfig};
use tessera_server::{Server, ServerConfig};
use tessera_session::{
    MemoryStore, RedisStore, SessionManager, SessionPolicy, SharedStore, StaticVerifier,
};

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Keep sessions in process memory instead of Redis
    #[arg(long)]
    pub memory: bool,

    /// Session lifetime in seconds (overrides config)
    #[arg(long)]
    pub ttl: Option<u64>,

    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Everything `start` needs, after merging files, environment and flags.
#[derive(Debug)]
struct Settings {
    addr: SocketAddr,
    request_logging: bool,
    backend: StoreBackend,
    redis_url: String,
    cleanup_interval: Duration,
    policy: SessionPolicy,
    users: Option<HashMap<String, String>>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    let mut loaded = super::load(args.config.as_deref())?;

    if ctx.verbose {
        let sources = loaded.loaded_from();
        if sources.is_empty() {
            println!("No config files found, using defaults + CLI args");
        } else {
            for source in sources {
                println!("Loaded config: {}", source.display());
            }
        }
    }

    loaded.config.apply_env_overrides()?;
    let settings = resolve(&args, &loaded)?;

    // ── Build the session engine ────────────────────────────────────────

    let mut cleanup = None;
    let store: SharedStore = match settings.backend {
        StoreBackend::Redis => {
            let store = RedisStore::connect(&settings.redis_url)
                .await
                .with_context(|| format!("Failed to connect to Redis at {}", settings.redis_url))?;
            tracing::info!(url = %settings.redis_url, "Connected to Redis");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            let store = MemoryStore::new();
            cleanup = Some(store.spawn_cleanup_task(settings.cleanup_interval));
            tracing::warn!("Using in-memory session store; sessions are lost on restart");
            Arc::new(store)
        }
    };

    let verifier = match settings.users {
        Some(users) => StaticVerifier::new(users),
        None => StaticVerifier::demo(),
    };
    if verifier.is_empty() {
        eprintln!("warning: no users configured, every login will be rejected");
    }
    if ctx.verbose {
        println!("Users: {}", verifier.len());
        println!("Session TTL: {}s", settings.policy.ttl.as_secs());
        println!("Origin: {}", settings.policy.origin);
    }

    let sessions = SessionManager::from_shared(
        Arc::new(verifier),
        store,
        settings.policy,
    );

    // ── Start server ────────────────────────────────────────────────────

    let server_config = ServerConfig::new()
        .with_bind_address(settings.addr)
        .with_request_logging(settings.request_logging);
    let server = Server::new(sessions, server_config);

    println!("Tessera server starting on http://{}", settings.addr);
    println!("Press Ctrl+C to stop");

    let served = server.run().await;
    if let Some(task) = cleanup {
        task.abort();
    }
    served?;
    Ok(())
}

/// Merge the loaded config with command-line overrides.
fn resolve(args: &StartArgs, loaded: &LoadedConfig) -> Result<Settings> {
    let mut config: TesseraConfig = loaded.config.clone();

    if let Some(ttl) = args.ttl {
        config.session.get_or_insert_with(Default::default).ttl_secs = ttl;
    }
    if args.memory {
        config.store.get_or_insert_with(Default::default).backend = StoreBackend::Memory;
    }
    config.validate()?;

    let server = config.server();
    let port = args.port.unwrap_or(server.port);
    let bind = args.bind.clone().unwrap_or(server.bind);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    let store = config.store();
    let session = config.session();

    let mut policy = SessionPolicy::new()
        .with_ttl(session.ttl())
        .with_store_timeout(store.timeout());
    if let Some(origin) = session.origin {
        policy = policy.with_origin(origin);
    }

    Ok(Settings {
        addr,
        request_logging: server.request_logging,
        backend: store.backend,
        redis_url: store.redis_url(),
        cleanup_interval: store.cleanup_interval(),
        policy,
        users: config.users.map(|users| users.into_iter().collect()),
    })
}
