//! Configuration loading
//!
//! Bootstrap configuration comes from a TOML file. Values resolve in this
//! priority order:
//! 1. Command-line arguments / environment variables (via `ConfigOverrides`)
//! 2. TOML config file
//! 3. OS-dependent compiled defaults
//!
//! A missing config file is not fatal: a warning is logged and defaults are
//! used. A config file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Path to the SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[serde(default)]
    pub bind: Option<String>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Event bus configuration (optional)
    #[serde(default)]
    pub events: EventsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log filter directive (trace, debug, info, warn, error or an EnvFilter string)
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

/// Event bus configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Number of events buffered per subscriber before the oldest are dropped
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_BIND: &str = "127.0.0.1";

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_capacity() -> usize {
    1000
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind: String,
    pub port: u16,
    pub log_level: String,
    pub event_capacity: usize,
}

impl Config {
    /// Merge TOML values with overrides, filling gaps with compiled defaults
    pub fn resolve(toml_config: TomlConfig, overrides: ConfigOverrides) -> Self {
        Self {
            database_path: overrides
                .database_path
                .or(toml_config.database_path)
                .unwrap_or_else(default_database_path),
            bind: overrides
                .bind
                .or(toml_config.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: overrides.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            log_level: overrides.log_level.unwrap_or(toml_config.logging.level),
            event_capacity: toml_config.events.capacity,
        }
    }

    /// Socket address string for the HTTP listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Load the TOML bootstrap configuration
///
/// An explicitly requested path must exist. Without one, the platform
/// config locations are tried and defaults are used when none exist.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match find_config_file() {
            Some(path) => path,
            None => {
                warn!("No config file found, using built-in defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = parse_toml_config(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Parse TOML text into a bootstrap configuration
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
}

/// Locate the config file for the current platform
///
/// Linux checks `~/.config/dramlog/config.toml` then `/etc/dramlog/config.toml`.
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("dramlog").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/dramlog/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("dramlog"))
        .unwrap_or_else(|| PathBuf::from("./dramlog_data"))
        .join("dramlog.db")
}
