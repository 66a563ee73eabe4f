//! Addressable key/value containers.
//!
//! A container never overwrites: `try_add` on an existing key leaves the
//! stored value alone and reports `false`. Key order from `keys` is
//! unspecified.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::StoreError;

/// Byte-keyed storage for credentials, manifests and slices.
pub trait Container: Send + Sync {
    /// Stores `value` under `key` unless the key is taken. Returns true if
    /// the value was stored.
    fn try_add(&self, key: &[u8], value: &[u8]) -> Result<bool, StoreError>;

    /// Returns the value stored under `key`.
    fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Removes `key`. Returns true if it was present.
    fn try_remove(&self, key: &[u8]) -> Result<bool, StoreError>;

    /// All stored keys, in unspecified order.
    fn keys(&self) -> Result<Vec<Vec<u8>>, StoreError>;

    /// Stored keys starting with `prefix`, in unspecified order.
    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, StoreError> {
        let mut keys = self.keys()?;
        keys.retain(|key| key.starts_with(prefix));
        Ok(keys)
    }

    /// Returns true if `key` is present.
    fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.try_get(key)?.is_some())
    }

    /// Number of stored entries.
    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.keys()?.len())
    }
}

/// Container held in memory.
#[derive(Debug, Default)]
pub struct MemoryContainer {
    entries: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Container for MemoryContainer {
    fn try_add(&self, key: &[u8], value: &[u8]) -> Result<bool, StoreError> {
        let mut entries = self.entries.write();
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_vec(), value.to_vec());
        Ok(true)
    }

    fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn try_remove(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.entries.write().remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        Ok(self.entries.read().keys().cloned().collect())
    }

    fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.entries.read().contains_key(key))
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_does_not_overwrite() {
        let container = MemoryContainer::new();
        assert!(container.try_add(b"k", b"first").unwrap());
        assert!(!container.try_add(b"k", b"second").unwrap());
        assert_eq!(container.try_get(b"k").unwrap(), Some(b"first".to_vec()));
    }

    #[test]
    fn test_remove_and_keys() {
        let container = MemoryContainer::new();
        container.try_add(b"a", b"1").unwrap();
        container.try_add(b"b", b"2").unwrap();

        let mut keys = container.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);

        assert!(container.try_remove(b"a").unwrap());
        assert!(!container.try_remove(b"a").unwrap());
        assert!(!container.contains(b"a").unwrap());
        assert_eq!(container.len().unwrap(), 1);
    }

    #[test]
    fn test_keys_with_prefix() {
        let container = MemoryContainer::new();
        container.try_add(b"ab1", b"").unwrap();
        container.try_add(b"ab2", b"").unwrap();
        container.try_add(b"b", b"").unwrap();

        let mut keys = container.keys_with_prefix(b"ab").unwrap();
        keys.sort();
        assert_eq!(keys, vec![b"ab1".to_vec(), b"ab2".to_vec()]);
        assert!(container.keys_with_prefix(b"c").unwrap().is_empty());
    }

    #[test]
    fn test_missing_key() {
        let container = MemoryContainer::new();
        assert_eq!(container.try_get(b"nope").unwrap(), None);
    }
}
