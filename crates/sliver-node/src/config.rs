//! Node configuration.
//!
//! ```toml
//! [node]
//! host = "node-1.local:7000"
//!
//! [auth]
//! secret = "<32 bytes, base64>"
//! max_clock_skew_secs = 300
//!
//! [storage]
//! backend = "rocksdb"
//! base_path = "/var/lib/sliver"
//!
//! [coding]
//! fragment_size = 65536
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sliver_auth::AuthConfig;
use sliver_core::DEFAULT_FRAGMENT_SIZE;
use sliver_store::StoreConfig;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid TOML for the schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// The `[node]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Host name requests must be addressed to
    pub host: String,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
        }
    }
}

/// The `[coding]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodingConfig {
    /// Fragment size (m) in bytes
    pub fragment_size: usize,
    /// Random slices produced beyond the systematic ones when uploading
    pub redundancy: usize,
}

impl Default for CodingConfig {
    fn default() -> Self {
        Self {
            fragment_size: DEFAULT_FRAGMENT_SIZE,
            redundancy: 2,
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node identity
    pub node: NodeSection,
    /// Request authorization
    pub auth: AuthConfig,
    /// Storage backend
    pub storage: StoreConfig,
    /// Slice geometry
    pub coding: CodingConfig,
}

impl NodeConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Creates an in-memory configuration for `host`.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            node: NodeSection { host: host.into() },
            ..Default::default()
        }
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.coding.fragment_size == 0 {
            return Err(ConfigError::Invalid("coding.fragment_size must be positive".into()));
        }
        if self.auth.max_clock_skew_secs < 0 {
            return Err(ConfigError::Invalid("auth.max_clock_skew_secs must not be negative".into()));
        }
        if self.auth.nonce_length == 0 || self.auth.public_id_length == 0 {
            return Err(ConfigError::Invalid("auth lengths must be positive".into()));
        }
        if self.node.host.is_empty() {
            return Err(ConfigError::Invalid("node.host must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sliver_store::StorageBackend;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = NodeConfig::from_toml_str("").unwrap();
        assert_eq!(config, NodeConfig::default());
        assert_eq!(config.coding.fragment_size, 65536);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_full_config() {
        let config = NodeConfig::from_toml_str(
            r#"
            [node]
            host = "node-7:7000"

            [auth]
            secret = "BQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQU="
            max_clock_skew_secs = 120

            [storage]
            backend = "rocksdb"
            base_path = "/var/lib/sliver"

            [coding]
            fragment_size = 4096
            "#,
        )
        .unwrap();

        assert_eq!(config.node.host, "node-7:7000");
        assert_eq!(config.auth.max_clock_skew_secs, 120);
        assert!(config.auth.server_secret().is_ok());
        assert_eq!(config.storage.backend, StorageBackend::Rocksdb);
        assert_eq!(config.coding.fragment_size, 4096);
        assert_eq!(config.coding.redundancy, 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            NodeConfig::from_toml_str("[coding]\nfragment_size = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            NodeConfig::from_toml_str("[node]\nhost = 5"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = NodeConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, NodeConfig::default());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("node.toml");
        std::fs::write(&path, "[node]\nhost = \"h\"").unwrap();
        assert_eq!(NodeConfig::load(&path).unwrap().node.host, "h");
    }
}
