//! Storage configuration.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::container::{Container, MemoryContainer};
use crate::credential::CredentialStore;
use crate::manifest::ManifestStore;
use crate::rocks::{open_db, RocksContainer};
use crate::slice::SliceStore;
use crate::StoreError;

const SLICES_CF: &str = "slices";
const MANIFESTS_CF: &str = "manifests";
const OWNERS_CF: &str = "owners";
const REFERENCES_CF: &str = "references";
const CREDENTIALS_CF: &str = "credentials";

/// Where containers keep their data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; lost on exit
    #[default]
    Memory,
    /// RocksDB under `base_path`
    Rocksdb,
}

/// The `[storage]` section of a node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage backend
    pub backend: StorageBackend,
    /// Base path for on-disk storage
    pub base_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            base_path: PathBuf::from(".sliver"),
        }
    }
}

/// One container per stored kind.
#[derive(Clone)]
pub struct StorageContainers {
    /// Slices by hash
    pub slices: Arc<dyn Container>,
    /// Manifests by id
    pub manifests: Arc<dyn Container>,
    /// Manifest owners by manifest id
    pub owners: Arc<dyn Container>,
    /// Slice-to-manifest references, keyed by slice hash then manifest id
    pub references: Arc<dyn Container>,
    /// Credentials by name
    pub credentials: Arc<dyn Container>,
}

impl StorageContainers {
    /// Fresh in-memory containers.
    pub fn in_memory() -> Self {
        Self {
            slices: Arc::new(MemoryContainer::new()),
            manifests: Arc::new(MemoryContainer::new()),
            owners: Arc::new(MemoryContainer::new()),
            references: Arc::new(MemoryContainer::new()),
            credentials: Arc::new(MemoryContainer::new()),
        }
    }

    /// Slice store over the slice container.
    pub fn slice_store(&self) -> SliceStore {
        SliceStore::new(self.slices.clone())
    }

    /// Manifest store over the manifest, owner and reference containers.
    pub fn manifest_store(&self) -> ManifestStore {
        ManifestStore::new(
            self.manifests.clone(),
            self.owners.clone(),
            self.references.clone(),
        )
    }

    /// Credential keyring over the credential container.
    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::new(self.credentials.clone())
    }
}

impl StoreConfig {
    /// Creates a RocksDB configuration rooted at `base_path`.
    pub fn rocksdb(base_path: PathBuf) -> Self {
        Self {
            backend: StorageBackend::Rocksdb,
            base_path,
        }
    }

    /// Returns the database path.
    pub fn db_path(&self) -> PathBuf {
        self.base_path.join("db")
    }

    /// Opens the containers for the configured backend.
    pub fn open(&self) -> Result<StorageContainers, StoreError> {
        match self.backend {
            StorageBackend::Memory => Ok(StorageContainers::in_memory()),
            StorageBackend::Rocksdb => {
                std::fs::create_dir_all(&self.base_path)?;
                let db = open_db(
                    &self.db_path(),
                    &[SLICES_CF, MANIFESTS_CF, OWNERS_CF, REFERENCES_CF, CREDENTIALS_CF],
                )?;
                Ok(StorageContainers {
                    slices: Arc::new(RocksContainer::with_db(db.clone(), SLICES_CF)),
                    manifests: Arc::new(RocksContainer::with_db(db.clone(), MANIFESTS_CF)),
                    owners: Arc::new(RocksContainer::with_db(db.clone(), OWNERS_CF)),
                    references: Arc::new(RocksContainer::with_db(db.clone(), REFERENCES_CF)),
                    credentials: Arc::new(RocksContainer::with_db(db, CREDENTIALS_CF)),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sliver_proto::Slice;
    use tempfile::TempDir;

    #[test]
    fn test_config_paths() {
        let config = StoreConfig::rocksdb(PathBuf::from("/tmp/sliver"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/sliver/db"));
    }

    #[test]
    fn test_parse_backend() {
        let config: StoreConfig = toml::from_str("backend = \"rocksdb\"\nbase_path = \"/data\"").unwrap();
        assert_eq!(config.backend, StorageBackend::Rocksdb);
        assert_eq!(config.base_path, PathBuf::from("/data"));

        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_rocksdb_containers_persist() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::rocksdb(dir.path().to_path_buf());
        let slice = Slice::new("101".parse().unwrap(), vec![9; 8]).unwrap();

        let hash = {
            let containers = config.open().unwrap();
            containers.slice_store().put(&slice).unwrap().0
        };

        let containers = config.open().unwrap();
        assert_eq!(containers.slice_store().get(&hash).unwrap(), Some(slice));
        assert!(containers.manifest_store().list().unwrap().is_empty());
    }
}
