//! CLI command handlers.

pub mod config;
pub mod start;

use std::path::Path;

use anyhow::Result;
use tessera_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Load an explicit config file, or discover and merge the usual layers.
pub(crate) fn load(path: Option<&Path>) -> Result<LoadedConfig> {
    let loaded = match path {
        Some(path) => LoadedConfig::from_file(path)?,
        None => tessera_config::load_config(None)?,
    };
    Ok(loaded)
}
