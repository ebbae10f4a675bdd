//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use tessera_config::{self, ConfigError, TesseraConfig};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration as TOML
    Show {
        /// Path to config file (overrides default discovery)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show which config files are loaded and their precedence
    Which,

    /// Show configuration file path
    Path,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./tessera.toml) instead of user config
        #[arg(long)]
        local: bool,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show { config } => cmd_show(config, ctx).await,
        ConfigCommand::Which => cmd_which().await,
        ConfigCommand::Path => cmd_path().await,
        ConfigCommand::Init { local } => cmd_init(local).await,
    }
}

async fn cmd_show(path: Option<PathBuf>, ctx: &Context) -> Result<()> {
    let mut loaded = super::load(path.as_deref())?;
    loaded.config.apply_env_overrides()?;

    if ctx.verbose {
        let sources = loaded.loaded_from();
        if sources.is_empty() {
            eprintln!("No config files loaded (using defaults)");
        } else {
            for source in sources {
                eprintln!("Loaded config: {}", source.display());
            }
        }
    }

    print!("{}", resolved(&loaded.config).to_toml()?);
    Ok(())
}

async fn cmd_which() -> Result<()> {
    let loaded = tessera_config::load_config(None)?;

    println!("Config file search order (later overrides earlier):\n");

    for source in &loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} [{}] {}", status, source.layer, source.path.display());
    }

    println!();
    let loaded_count = loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'tessera config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

async fn cmd_path() -> Result<()> {
    if let Some(path) = tessera_config::user_config_path() {
        println!("{}", path.display());
    } else {
        eprintln!("Could not determine config directory");
    }
    Ok(())
}

async fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("tessera.toml")
    } else {
        tessera_config::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
    };

    match tessera_config::create_config_file(&resolved(&TesseraConfig::new()), &path) {
        Ok(()) => {}
        Err(ConfigError::Exists { .. }) => {
            println!("Config file already exists: {}", path.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }
    println!("✓ Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  add a [users] table to replace the demo accounts");
    println!("  tessera config show     # verify configuration");

    Ok(())
}

/// Fill every section with its effective values and mask passwords.
fn resolved(config: &TesseraConfig) -> TesseraConfig {
    TesseraConfig {
        server: Some(config.server()),
        store: Some(config.store()),
        session: Some(config.session()),
        users: config.users.as_ref().map(|users| {
            users
                .keys()
                .map(|name| (name.clone(), "********".to_string()))
                .collect()
        }),
    }
}
