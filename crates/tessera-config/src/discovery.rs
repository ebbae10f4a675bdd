//! Locating and layering config files.
//!
//! Two file layers are read, the user layer then the project layer
//! (`./tessera.toml`), and merged section by section with the later layer
//! winning. A layer that is absent is skipped. A layer that exists but
//! cannot be read or parsed is an error: a partially applied config would
//! drop the operator's `[users]` table and fall back to the demo accounts.

use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::{ConfigError, Result, TesseraConfig};

const PROJECT_CONFIG_FILE: &str = "tessera.toml";
const USER_CONFIG_FILE: &str = "config.toml";
const APP_NAME: &str = "tessera";

/// Overrides the user config directory when set and non-empty.
pub const CONFIG_DIR_ENV: &str = "TESSERA_CONFIG_DIR";

/// Which layer a config file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Per-user file under the config directory.
    User,
    /// `tessera.toml` in the working (or given project) directory.
    Project,
    /// A file named on the command line; no other layer is read.
    Explicit,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Layer::User => "user",
            Layer::Project => "project",
            Layer::Explicit => "explicit",
        })
    }
}

/// One config file that was considered.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub layer: Layer,
    pub path: PathBuf,
    /// False when the file does not exist.
    pub loaded: bool,
}

/// Merged configuration plus the files it came from, lowest precedence first.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TesseraConfig,
    pub sources: Vec<ConfigSource>,
}

impl LoadedConfig {
    /// Load exactly one file, skipping discovery. The file must exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self {
            config: load_config_file(path)?,
            sources: vec![ConfigSource {
                layer: Layer::Explicit,
                path: path.to_path_buf(),
                loaded: true,
            }],
        })
    }

    /// Paths of the files that contributed to `config`.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter_map(|s| s.loaded.then_some(s.path.as_path()))
            .collect()
    }
}

/// Where the discoverable layers live.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// `None` when no config directory can be determined.
    pub user: Option<PathBuf>,
    pub project: PathBuf,
}

impl ConfigPaths {
    /// Resolve layer paths. `config_dir` wins over `TESSERA_CONFIG_DIR` and
    /// the platform default; `project_dir` defaults to the working directory.
    pub fn discover(project_dir: Option<&Path>, config_dir: Option<&Path>) -> Self {
        let user = match config_dir {
            Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
            None => user_config_path(),
        };
        let project = project_dir.unwrap_or(Path::new("")).join(PROJECT_CONFIG_FILE);
        Self { user, project }
    }

    /// Read and merge every layer that exists.
    pub fn load(&self) -> Result<LoadedConfig> {
        let layers = self
            .user
            .iter()
            .map(|p| (Layer::User, p))
            .chain(std::iter::once((Layer::Project, &self.project)));

        let mut config = TesseraConfig::new();
        let mut sources = Vec::with_capacity(2);
        for (layer, path) in layers {
            let found = read_layer(path)?;
            sources.push(ConfigSource {
                layer,
                path: path.clone(),
                loaded: found.is_some(),
            });
            if let Some(found) = found {
                config.merge(found);
            }
        }

        Ok(LoadedConfig { config, sources })
    }
}

/// Discover and merge the user and project layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    ConfigPaths::discover(project_dir, None).load()
}

/// Like [`load_config`], with an explicit user config directory.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    ConfigPaths::discover(project_dir, config_dir).load()
}

/// Parse one file. A missing file is a [`ConfigError::ReadFile`].
pub fn load_config_file(path: &Path) -> Result<TesseraConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    parse_layer(path, &text)
}

/// Write `config` to a new file, creating parent directories.
///
/// Never replaces an existing file; that case is [`ConfigError::Exists`].
pub fn create_config_file(config: &TesseraConfig, path: &Path) -> Result<()> {
    let write_err = |source| ConfigError::WriteFile {
        path: path.display().to_string(),
        source,
    };
    let text = config.to_toml()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => ConfigError::Exists {
                path: path.display().to_string(),
            },
            _ => write_err(e),
        })?;
    file.write_all(text.as_bytes()).map_err(write_err)
}

/// The user config file, `<user_config_dir>/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// The user config directory: `TESSERA_CONFIG_DIR`, else
/// `<platform config dir>/tessera`. Logs are written under it too.
pub fn user_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join(APP_NAME)),
    }
}

fn read_layer(path: &Path) -> Result<Option<TesseraConfig>> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_layer(path, &text).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        }),
    }
}

fn parse_layer(path: &Path, text: &str) -> Result<TesseraConfig> {
    toml::from_str(text).map_err(|source| ConfigError::ParseFile {
        path: path.display().to_string(),
        source,
    })
}
