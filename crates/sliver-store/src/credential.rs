//! Client-side credential keyring.
//!
//! Holds the credentials a client was issued, one per node it talks to,
//! keyed by a caller-chosen name (typically the node host).

use std::sync::Arc;

use sliver_core::encoding::{CanonicalDecode, CanonicalEncode};
use sliver_proto::Credential;
use tracing::debug;

use crate::container::Container;
use crate::StoreError;

/// Named credential storage.
#[derive(Clone)]
pub struct CredentialStore {
    container: Arc<dyn Container>,
}

impl CredentialStore {
    /// Creates a keyring over `container`.
    pub fn new(container: Arc<dyn Container>) -> Self {
        Self { container }
    }

    /// Stores `credential` under `name`. Returns false if the name is taken.
    pub fn insert(&self, name: &str, credential: &Credential) -> Result<bool, StoreError> {
        let added = self.container.try_add(name.as_bytes(), &credential.to_vec())?;
        debug!(name, added, "Stored credential");
        Ok(added)
    }

    /// Retrieves the credential stored under `name`.
    pub fn get(&self, name: &str) -> Result<Option<Credential>, StoreError> {
        match self.container.try_get(name.as_bytes())? {
            Some(bytes) => Ok(Some(Credential::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Removes the credential stored under `name`.
    pub fn remove(&self, name: &str) -> Result<bool, StoreError> {
        self.container.try_remove(name.as_bytes())
    }

    /// Names of all stored credentials.
    pub fn names(&self) -> Result<Vec<String>, StoreError> {
        self.container
            .keys()?
            .into_iter()
            .map(|key| {
                String::from_utf8(key).map_err(|e| StoreError::InvalidData(e.to_string()))
            })
            .collect()
    }
}
