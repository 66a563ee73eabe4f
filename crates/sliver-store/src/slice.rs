//! Slice storage.
//!
//! Slices are keyed by the hash of their encoding, so storing the same
//! slice twice keeps one copy.

use std::sync::Arc;

use sliver_core::encoding::{CanonicalDecode, CanonicalEncode};
use sliver_core::Hash;
use sliver_proto::Slice;
use tracing::{debug, warn};

use crate::container::Container;
use crate::StoreError;

/// Content-addressed slice store.
#[derive(Clone)]
pub struct SliceStore {
    container: Arc<dyn Container>,
}

impl SliceStore {
    /// Creates a store over `container`.
    pub fn new(container: Arc<dyn Container>) -> Self {
        Self { container }
    }

    /// Stores a slice. Returns its hash and whether it was newly stored.
    pub fn put(&self, slice: &Slice) -> Result<(Hash, bool), StoreError> {
        let encoded = slice.to_vec();
        let hash = Hash::compute(&encoded);
        let created = self.container.try_add(hash.as_bytes(), &encoded)?;

        debug!(hash = %hash, size = encoded.len(), created, "Stored slice");
        Ok((hash, created))
    }

    /// Retrieves a slice by hash, checking the stored bytes still match it.
    pub fn get(&self, hash: &Hash) -> Result<Option<Slice>, StoreError> {
        let Some(bytes) = self.container.try_get(hash.as_bytes())? else {
            return Ok(None);
        };

        let actual = Hash::compute(&bytes);
        if actual != *hash {
            warn!(expected = %hash, actual = %actual, "Slice hash mismatch");
            return Err(StoreError::InvalidData("Hash mismatch".to_string()));
        }
        Ok(Some(Slice::from_bytes(&bytes)?))
    }

    /// Checks if a slice exists.
    pub fn contains(&self, hash: &Hash) -> Result<bool, StoreError> {
        self.container.contains(hash.as_bytes())
    }

    /// Removes a slice. Returns true if it was stored.
    pub fn remove(&self, hash: &Hash) -> Result<bool, StoreError> {
        let removed = self.container.try_remove(hash.as_bytes())?;
        if removed {
            debug!(hash = %hash, "Removed slice");
        }
        Ok(removed)
    }

    /// Lists all slice hashes.
    pub fn list(&self) -> Result<Vec<Hash>, StoreError> {
        self.container
            .keys()?
            .iter()
            .map(|key| Hash::from_slice(key).map_err(StoreError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;

    fn store() -> SliceStore {
        SliceStore::new(Arc::new(MemoryContainer::new()))
    }

    fn slice(coefficients: &str, symbol: &[u8]) -> Slice {
        Slice::new(coefficients.parse().unwrap(), symbol.to_vec()).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let store = store();
        let s = slice("1011", b"payload");
        let (hash, created) = store.put(&s).unwrap();

        assert!(created);
        assert_eq!(hash, s.compute_hash());
        assert_eq!(store.get(&hash).unwrap(), Some(s));
    }

    #[test]
    fn test_identical_slices_stored_once() {
        let store = store();
        let (h1, c1) = store.put(&slice("01", b"ab")).unwrap();
        let (h2, c2) = store.put(&slice("01", b"ab")).unwrap();

        assert_eq!(h1, h2);
        assert!(c1);
        assert!(!c2);
        assert_eq!(store.list().unwrap(), vec![h1]);
    }

    #[test]
    fn test_corrupted_value_detected() {
        let container = Arc::new(MemoryContainer::new());
        let store = SliceStore::new(container.clone());
        let wrong_key = Hash::compute(b"something else");
        container
            .try_add(wrong_key.as_bytes(), &slice("1", b"x").to_vec())
            .unwrap();

        assert!(matches!(store.get(&wrong_key), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_remove() {
        let store = store();
        let (hash, _) = store.put(&slice("11", b"zz")).unwrap();
        assert!(store.contains(&hash).unwrap());
        assert!(store.remove(&hash).unwrap());
        assert!(!store.contains(&hash).unwrap());
        assert_eq!(store.get(&hash).unwrap(), None);
    }
}
