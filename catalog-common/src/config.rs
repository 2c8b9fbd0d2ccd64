//! Configuration loading and database path resolution
//!
//! Resolution priority, highest first:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Application directory name under the platform config/data dirs
pub const APP_DIR_NAME: &str = "collectible-catalog";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;

/// Default bind address
pub const DEFAULT_BIND: &str = "127.0.0.1";

pub const ENV_PORT: &str = "CATALOG_PORT";
pub const ENV_BIND: &str = "CATALOG_BIND";
pub const ENV_DATABASE: &str = "CATALOG_DATABASE";
pub const ENV_CONFIG: &str = "CATALOG_CONFIG";
pub const ENV_SEED: &str = "CATALOG_SEED";

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; anything missing falls through to the
/// compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// HTTP bind address
    #[serde(default)]
    pub bind: Option<String>,

    /// Catalog seed file loaded on startup
    #[serde(default)]
    pub seed_file: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values supplied on the command line (already parsed by the binary)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub database: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub seed: Option<PathBuf>,
}

/// Fully resolved server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub bind: String,
    pub database_path: PathBuf,
    pub seed_file: Option<PathBuf>,
    pub log_level: String,
}

impl ServerConfig {
    /// Resolve configuration from CLI, environment, TOML file and defaults
    ///
    /// A missing or malformed TOML file is logged and ignored; startup
    /// never fails because of it.
    pub fn resolve(cli: CliOverrides) -> Self {
        let config_path = cli
            .config
            .clone()
            .or_else(|| std::env::var(ENV_CONFIG).ok().map(PathBuf::from))
            .or_else(default_config_path);

        let toml_config = match config_path {
            Some(path) if path.exists() => match load_toml_config(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring config file {}: {}", path.display(), e);
                    TomlConfig::default()
                }
            },
            Some(path) => {
                if cli.config.is_some() {
                    warn!("Config file not found: {} (using defaults)", path.display());
                }
                TomlConfig::default()
            }
            None => TomlConfig::default(),
        };

        Self::merge(cli, EnvOverrides::from_env(), toml_config)
    }

    /// Merge the configuration tiers in priority order
    pub fn merge(cli: CliOverrides, env: EnvOverrides, toml_config: TomlConfig) -> Self {
        let port = cli
            .port
            .or(env.port)
            .or(toml_config.port)
            .unwrap_or(DEFAULT_PORT);

        let bind = cli
            .bind
            .or(env.bind)
            .or(toml_config.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let database_path = cli
            .database
            .or(env.database)
            .or(toml_config.database_path)
            .unwrap_or_else(default_database_path);

        let seed_file = cli.seed.or(env.seed).or(toml_config.seed_file);

        Self {
            port,
            bind,
            database_path,
            seed_file,
            log_level: toml_config.logging.level,
        }
    }
}

/// Values read from `CATALOG_*` environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub database: Option<PathBuf>,
    pub seed: Option<PathBuf>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let port = std::env::var(ENV_PORT).ok().and_then(|v| match v.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                warn!("Ignoring invalid {}={}", ENV_PORT, v);
                None
            }
        });

        Self {
            port,
            bind: std::env::var(ENV_BIND).ok(),
            database: std::env::var(ENV_DATABASE).ok().map(PathBuf::from),
            seed: std::env::var(ENV_SEED).ok().map(PathBuf::from),
        }
    }
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Platform config file location (`<config_dir>/collectible-catalog/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// OS-dependent default database path
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./catalog_data"))
        .join("catalog.db")
}
