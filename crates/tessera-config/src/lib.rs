//! Configuration system for the Tessera session service.
//!
//! Provides TOML-based configuration with:
//! - `[server]`, `[store]`, `[session]` and `[users]` sections
//! - Config file layering (user config + project-local overrides); a broken
//!   layer is an error, never skipped
//! - Redis connection overrides from the environment

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    CONFIG_DIR_ENV, ConfigPaths, ConfigSource, Layer, LoadedConfig, create_config_file,
    load_config, load_config_file, load_config_with_options, user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
