//! ytq-server runtime configuration
//!
//! Merges command-line overrides onto the TOML bootstrap config.

use std::path::PathBuf;
use tracing::warn;
use ytq_common::api::{generate_host_key, hash_host_key};
use ytq_common::config::TomlConfig;

use crate::queue::Policy;

/// Values supplied on the command line (or their env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub database_path: Option<PathBuf>,
    pub host_key: Option<String>,
    pub no_title_lookup: bool,
    pub ignore_forwarded_for: bool,
}

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// SHA-256 hex digest of the host key
    pub host_key_hash: String,
    pub title_lookup: bool,
    /// Identity from `X-Forwarded-For` rather than the peer address
    pub trust_forwarded_for: bool,
    /// Used only when no policy has been persisted yet
    pub default_policy: Policy,
}

impl Config {
    /// CLI > TOML > compiled defaults
    ///
    /// A blank or missing host key is replaced by a random one, which is
    /// logged once so the operator can use it.
    pub fn resolve(cli: CliOverrides, toml: TomlConfig) -> Self {
        let database_path = cli
            .database_path
            .clone()
            .unwrap_or_else(|| toml.resolved_database_path());

        let configured_key = cli
            .host_key
            .or(toml.host_key)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let host_key_hash = match configured_key {
            Some(key) => hash_host_key(&key),
            None => {
                let key = generate_host_key();
                warn!("No host key configured; generated host key for this run: {}", key);
                hash_host_key(&key)
            }
        };

        Self {
            bind_address: cli.bind_address.unwrap_or(toml.bind_address),
            port: cli.port.unwrap_or(toml.port),
            database_path,
            host_key_hash,
            title_lookup: toml.title_lookup && !cli.no_title_lookup,
            trust_forwarded_for: toml.trust_forwarded_for && !cli.ignore_forwarded_for,
            default_policy: toml.policy.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_toml() {
        let toml = TomlConfig {
            port: 6000,
            host_key: Some("from-toml".to_string()),
            ..Default::default()
        };
        let cli = CliOverrides {
            port: Some(7000),
            host_key: Some("from-cli".to_string()),
            database_path: Some(PathBuf::from("/tmp/ytq-test.db")),
            ..Default::default()
        };

        let config = Config::resolve(cli, toml);
        assert_eq!(config.port, 7000);
        assert_eq!(config.host_key_hash, hash_host_key("from-cli"));
        assert_eq!(config.database_path, PathBuf::from("/tmp/ytq-test.db"));
        assert_eq!(config.bind_address, "0.0.0.0");
    }

    #[test]
    fn test_toml_values_used_without_cli() {
        let toml = TomlConfig {
            port: 6000,
            host_key: Some("from-toml".to_string()),
            title_lookup: false,
            ..Default::default()
        };

        let config = Config::resolve(CliOverrides::default(), toml);
        assert_eq!(config.port, 6000);
        assert_eq!(config.host_key_hash, hash_host_key("from-toml"));
        assert!(!config.title_lookup);
        assert_eq!(config.default_policy, Policy::default());
    }

    #[test]
    fn test_forwarded_for_can_be_disabled() {
        let config = Config::resolve(CliOverrides::default(), TomlConfig::default());
        assert!(config.trust_forwarded_for);

        let cli = CliOverrides {
            ignore_forwarded_for: true,
            ..Default::default()
        };
        assert!(!Config::resolve(cli, TomlConfig::default()).trust_forwarded_for);

        let toml = TomlConfig {
            trust_forwarded_for: false,
            ..Default::default()
        };
        assert!(!Config::resolve(CliOverrides::default(), toml).trust_forwarded_for);
    }

    #[test]
    fn test_blank_host_key_generates_one() {
        let cli = CliOverrides {
            host_key: Some("   ".to_string()),
            ..Default::default()
        };

        let config = Config::resolve(cli, TomlConfig::default());
        assert_eq!(config.host_key_hash.len(), 64);
        assert_ne!(config.host_key_hash, hash_host_key(""));
    }
}
