//! Bootstrap configuration loading
//!
//! Two-tier configuration:
//! 1. **TOML bootstrap**: port, database path, host key, logging, and the
//!    initial queue policy. Read once at startup.
//! 2. **Runtime policy**: persisted by the server in its `settings` table and
//!    changed through the host API. When present it overrides the TOML
//!    policy defaults.
//!
//! # Config file location priority
//!
//! 1. Command-line argument
//! 2. `YTQ_CONFIG` environment variable
//! 3. `<platform config dir>/ytq/config.toml`
//!
//! A missing file is never fatal: a warning is logged and compiled defaults
//! are used. A file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "YTQ_CONFIG";

/// Queue policy defaults applied when no persisted policy exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyDefaults {
    /// Minimum seconds between accepted submissions per identity
    pub submit_throttle_seconds: u64,

    /// Minimum seconds between name changes per identity
    pub name_cooldown_seconds: u64,

    /// Maximum number of history entries kept
    pub history_capacity: usize,

    /// Maximum number of pending entries accepted
    pub pending_capacity: usize,
}

impl Default for PolicyDefaults {
    fn default() -> Self {
        Self {
            submit_throttle_seconds: 180,
            name_cooldown_seconds: 3600,
            history_capacity: 20,
            pending_capacity: 50,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP server port
    pub port: u16,

    /// Address the HTTP server binds to
    pub bind_address: String,

    /// Path to SQLite database file (platform default when absent)
    pub database_path: Option<PathBuf>,

    /// Plain host key (a random key is generated when absent)
    pub host_key: Option<String>,

    /// Look up display titles over the network
    pub title_lookup: bool,

    /// Take submitter identity from `X-Forwarded-For`
    ///
    /// Only safe behind a reverse proxy that overwrites the header; otherwise
    /// clients can pick their own identity.
    pub trust_forwarded_for: bool,

    /// Initial queue policy
    pub policy: PolicyDefaults,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_address: "0.0.0.0".to_string(),
            database_path: None,
            host_key: None,
            title_lookup: true,
            trust_forwarded_for: true,
            policy: PolicyDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded TOML configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration following the location priority order
    ///
    /// Falls back to compiled defaults when no file can be found.
    pub fn load_or_default(cli_path: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_path) {
            Some(path) if path.exists() => Self::load(&path),
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                info!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Database path, falling back to the platform data directory
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// Resolve which config file to read
///
/// An explicit location (CLI or env) is returned even if it does not exist so
/// the caller can warn about it; the platform default is only returned when
/// the file is actually present.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|p| p.exists())
}

/// `<config dir>/ytq/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ytq").join("config.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ytq"))
        .unwrap_or_else(|| PathBuf::from("./ytq_data"))
        .join("ytq.db")
}

/// Create the parent directory of a file path if it does not exist yet
///
/// Safe to call repeatedly.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.bind_address, "0.0.0.0");
        assert!(config.title_lookup);
        assert!(config.trust_forwarded_for);
        assert_eq!(config.policy.submit_throttle_seconds, 180);
        assert_eq!(config.policy.name_cooldown_seconds, 3600);
        assert_eq!(config.policy.history_capacity, 20);
        assert_eq!(config.policy.pending_capacity, 50);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn test_partial_policy_section() {
        let config = TomlConfig::from_toml_str(
            r#"
            port = 8080

            [policy]
            history_capacity = 300
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.policy.history_capacity, 300);
        assert_eq!(config.policy.submit_throttle_seconds, 180);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let result = TomlConfig::from_toml_str("port = \"not a number\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_default_database_path_ends_with_file_name() {
        let path = default_database_path();
        assert!(path.ends_with("ytq.db"));
    }
}
