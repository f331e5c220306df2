//! Configuration system for the tasklist server.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/tasklist-server/config.toml`)
//! 4. Compiled defaults

use std::path::PathBuf;

use crate::service::StoragePolicy;

/// Errors that can occur when loading server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerConfigFile {
    server: ServerSection,
    storage: StorageSection,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerSection {
    bind_addr: Option<String>,
    static_dir: Option<PathBuf>,
}

/// `[storage]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StorageSection {
    data_file: Option<PathBuf>,
    strict: Option<bool>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the tasklist server.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Tasklist HTTP API server")]
pub struct ServerCliArgs {
    /// Address to bind the HTTP server to.
    #[arg(short, long, env = "TASKLIST_ADDR")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/tasklist-server/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON file holding the task collection.
    #[arg(long, env = "TASKLIST_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Directory of static client files served alongside the API.
    #[arg(long, env = "TASKLIST_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Report storage read/write failures as HTTP 500 instead of failing open.
    #[arg(long)]
    pub strict_storage: bool,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKLIST_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to (e.g., `0.0.0.0:3000`).
    pub bind_addr: String,
    /// Path of the persisted task collection.
    pub data_file: PathBuf,
    /// Optional directory served for paths outside `/api`.
    pub static_dir: Option<PathBuf>,
    /// How storage failures reach callers.
    pub storage_policy: StoragePolicy,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            data_file: PathBuf::from("tasks.json"),
            static_dir: None,
            storage_policy: StoragePolicy::FailOpen,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and missing file
    /// is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI > file > default. `--strict-storage` can only turn
    /// strict mode on.
    #[must_use]
    fn resolve(cli: &ServerCliArgs, file: &ServerConfigFile) -> Self {
        let defaults = Self::default();

        let strict = cli.strict_storage || file.storage.strict.unwrap_or(false);

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            data_file: cli
                .data_file
                .clone()
                .or_else(|| file.storage.data_file.clone())
                .unwrap_or(defaults.data_file),
            static_dir: cli
                .static_dir
                .clone()
                .or_else(|| file.server.static_dir.clone()),
            storage_policy: if strict {
                StoragePolicy::Strict
            } else {
                defaults.storage_policy
            },
            log_level: cli.log_level.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Reads the TOML config file.
///
/// An explicit path must exist. The default location
/// (`<config dir>/tasklist-server/config.toml`) is optional.
fn load_config_file(
    explicit_path: Option<&std::path::Path>,
) -> Result<ServerConfigFile, ConfigError> {
    let (path, required) = match explicit_path {
        Some(p) => (p.to_path_buf(), true),
        None => match dirs::config_dir() {
            Some(dir) => (dir.join("tasklist-server").join("config.toml"), false),
            None => return Ok(ServerConfigFile::default()),
        },
    };

    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ServerConfigFile::default());
        }
        Err(source) => return Err(ConfigError::ReadFile { path, source }),
    };
    Ok(toml::from_str(&contents)?)
}
