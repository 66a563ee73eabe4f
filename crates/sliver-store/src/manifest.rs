//! Manifest storage with ownership.
//!
//! The first credential to publish a manifest becomes its owner. Only the
//! owner may store slices under it or delete it. A manifest advertises
//! exactly the slices stored under it; each such slice carries a reference
//! back to the manifest, and deleting a manifest removes a slice only once
//! no other manifest references it.

use std::sync::Arc;

use parking_lot::Mutex;
use sliver_core::encoding::{CanonicalDecode, CanonicalEncode};
use sliver_core::{Hash, HASH_LENGTH};
use sliver_proto::{Manifest, Slice};
use tracing::{debug, warn};

use crate::container::Container;
use crate::slice::SliceStore;
use crate::StoreError;

/// Result of publishing a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Stored for the first time; the publisher now owns it
    Created,
    /// Already stored by the same owner with the same length
    Existing,
}

/// Key of the reference from slice `slice` to manifest `manifest`. Keys
/// sharing a slice hash prefix list every manifest using that slice.
fn reference_key(slice: &Hash, manifest: &Hash) -> [u8; 2 * HASH_LENGTH] {
    let mut key = [0u8; 2 * HASH_LENGTH];
    key[..HASH_LENGTH].copy_from_slice(slice.as_slice());
    key[HASH_LENGTH..].copy_from_slice(manifest.as_slice());
    key
}

/// Manifest store keyed by manifest id.
pub struct ManifestStore {
    manifests: Arc<dyn Container>,
    owners: Arc<dyn Container>,
    references: Arc<dyn Container>,
    /// Serialises read-modify-write of manifests, owners and references
    update_lock: Mutex<()>,
}

impl ManifestStore {
    /// Creates a store keeping manifests, their owners and slice references
    /// in three containers.
    pub fn new(
        manifests: Arc<dyn Container>,
        owners: Arc<dyn Container>,
        references: Arc<dyn Container>,
    ) -> Self {
        Self {
            manifests,
            owners,
            references,
            update_lock: Mutex::new(()),
        }
    }

    /// Publishes `manifest` on behalf of `owner`.
    ///
    /// Only the id and length are taken from `manifest`; slices become
    /// advertised by storing them with [`store_slice`](Self::store_slice).
    /// A manifest that already exists must belong to `owner` and describe
    /// the same length.
    pub fn publish(&self, manifest: &Manifest, owner: &[u8]) -> Result<PublishOutcome, StoreError> {
        let _guard = self.update_lock.lock();
        let key = manifest.id.as_bytes();

        let Some(stored) = self.load(&manifest.id)? else {
            if !self.owners.try_add(key, owner)? {
                return Err(StoreError::Conflict(format!(
                    "{}: stale owner record",
                    manifest.id
                )));
            }
            let bare = Manifest::new(manifest.id, manifest.length())
                .map_err(|e| StoreError::InvalidData(e.to_string()))?;
            if let Err(e) = self.manifests.try_add(key, &bare.to_vec()) {
                if let Err(undo) = self.owners.try_remove(key) {
                    warn!(manifest = %manifest.id, error = %undo, "Failed to undo owner record");
                }
                return Err(e);
            }
            debug!(
                manifest = %manifest.id,
                length = manifest.length(),
                ignored = manifest.slice_hashes().len(),
                "Published manifest"
            );
            return Ok(PublishOutcome::Created);
        };

        self.check_owner(&manifest.id, owner)?;
        if stored.length() != manifest.length() {
            return Err(StoreError::Conflict(format!(
                "{}: length {} differs from stored {}",
                manifest.id,
                manifest.length(),
                stored.length()
            )));
        }
        Ok(PublishOutcome::Existing)
    }

    /// Stores `slice` in `slices` under the manifest `id` and advertises it.
    /// Returns the slice hash and whether the slice bytes were new.
    pub fn store_slice(
        &self,
        id: &Hash,
        slice: &Slice,
        requester: &[u8],
        slices: &SliceStore,
    ) -> Result<(Hash, bool), StoreError> {
        let _guard = self.update_lock.lock();
        let mut manifest = self
            .load(id)?
            .ok_or_else(|| StoreError::ManifestNotFound(id.to_hex()))?;
        self.check_owner(id, requester)?;

        let (hash, created) = slices.put(slice)?;
        self.references.try_add(&reference_key(&hash, id), &[])?;
        let added = manifest
            .add_slice_hash(hash)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        if added {
            self.replace(&manifest)?;
            debug!(manifest = %id, slice = %hash, "Registered slice");
        }
        Ok((hash, created))
    }

    /// Deletes the manifest `id`. Each advertised slice loses its reference
    /// to it and is removed from `slices` once unreferenced. Returns the
    /// number of slices removed.
    pub fn delete(&self, id: &Hash, requester: &[u8], slices: &SliceStore) -> Result<usize, StoreError> {
        let _guard = self.update_lock.lock();
        let manifest = self
            .load(id)?
            .ok_or_else(|| StoreError::ManifestNotFound(id.to_hex()))?;
        self.check_owner(id, requester)?;

        let mut removed = 0usize;
        for hash in manifest.slice_hashes() {
            self.references.try_remove(&reference_key(hash, id))?;
            if self.referencing(hash)?.is_empty() && slices.remove(hash)? {
                removed += 1;
            }
        }
        self.manifests.try_remove(id.as_bytes())?;
        self.owners.try_remove(id.as_bytes())?;

        debug!(manifest = %id, slices_removed = removed, "Deleted manifest");
        Ok(removed)
    }

    /// Manifests that advertise the slice `hash`.
    pub fn referencing(&self, hash: &Hash) -> Result<Vec<Hash>, StoreError> {
        self.references
            .keys_with_prefix(hash.as_slice())?
            .iter()
            .map(|key| Hash::from_slice(&key[HASH_LENGTH..]).map_err(StoreError::from))
            .collect()
    }

    /// Retrieves a manifest.
    pub fn get(&self, id: &Hash) -> Result<Option<Manifest>, StoreError> {
        self.load(id)
    }

    /// Public id of the manifest's owner.
    pub fn owner(&self, id: &Hash) -> Result<Option<Vec<u8>>, StoreError> {
        self.owners.try_get(id.as_bytes())
    }

    /// Checks if a manifest exists.
    pub fn contains(&self, id: &Hash) -> Result<bool, StoreError> {
        self.manifests.contains(id.as_bytes())
    }

    /// Lists all manifest ids.
    pub fn list(&self) -> Result<Vec<Hash>, StoreError> {
        self.manifests
            .keys()?
            .iter()
            .map(|key| Hash::from_slice(key).map_err(StoreError::from))
            .collect()
    }

    fn load(&self, id: &Hash) -> Result<Option<Manifest>, StoreError> {
        match self.manifests.try_get(id.as_bytes())? {
            Some(bytes) => Ok(Some(Manifest::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Swaps the stored bytes of `manifest`, putting the old bytes back if
    /// the new ones cannot be written.
    fn replace(&self, manifest: &Manifest) -> Result<(), StoreError> {
        let key = manifest.id.as_bytes();
        let previous = self.manifests.try_get(key)?;
        self.manifests.try_remove(key)?;

        match self.manifests.try_add(key, &manifest.to_vec()) {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::Conflict(format!(
                "{}: concurrent manifest write",
                manifest.id
            ))),
            Err(e) => {
                if let Some(bytes) = previous {
                    if let Err(restore) = self.manifests.try_add(key, &bytes) {
                        warn!(manifest = %manifest.id, error = %restore, "Failed to restore manifest");
                    }
                }
                Err(e)
            }
        }
    }

    fn check_owner(&self, id: &Hash, requester: &[u8]) -> Result<(), StoreError> {
        match self.owners.try_get(id.as_bytes())? {
            Some(owner) if owner == requester => Ok(()),
            _ => Err(StoreError::NotOwner(id.to_hex())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::container::MemoryContainer;

    fn stores() -> (ManifestStore, SliceStore) {
        (
            ManifestStore::new(
                Arc::new(MemoryContainer::new()),
                Arc::new(MemoryContainer::new()),
                Arc::new(MemoryContainer::new()),
            ),
            SliceStore::new(Arc::new(MemoryContainer::new())),
        )
    }

    fn manifest(tag: &[u8]) -> Manifest {
        Manifest::new(Hash::compute(tag), 4).unwrap()
    }

    fn slice(bits: &str, byte: u8) -> Slice {
        Slice::new(bits.parse().unwrap(), vec![byte; 4]).unwrap()
    }

    /// Memory container whose next `try_add` calls fail.
    #[derive(Default)]
    struct FailingAdds {
        inner: MemoryContainer,
        failures: AtomicUsize,
    }

    impl Container for FailingAdds {
        fn try_add(&self, key: &[u8], value: &[u8]) -> Result<bool, StoreError> {
            let pending = self.failures.load(Ordering::SeqCst);
            if pending > 0 {
                self.failures.store(pending - 1, Ordering::SeqCst);
                return Err(StoreError::Database("injected".into()));
            }
            self.inner.try_add(key, value)
        }

        fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
            self.inner.try_get(key)
        }

        fn try_remove(&self, key: &[u8]) -> Result<bool, StoreError> {
            self.inner.try_remove(key)
        }

        fn keys(&self) -> Result<Vec<Vec<u8>>, StoreError> {
            self.inner.keys()
        }
    }

    #[test]
    fn test_publish_and_get() {
        let (manifests, _) = stores();
        let m = manifest(b"file");

        assert_eq!(manifests.publish(&m, b"alice").unwrap(), PublishOutcome::Created);
        assert_eq!(manifests.get(&m.id).unwrap(), Some(m.clone()));
        assert_eq!(manifests.owner(&m.id).unwrap(), Some(b"alice".to_vec()));
        assert_eq!(manifests.list().unwrap(), vec![m.id]);
        assert_eq!(manifests.publish(&m, b"alice").unwrap(), PublishOutcome::Existing);
    }

    #[test]
    fn test_published_hashes_not_advertised() {
        let (manifests, slices) = stores();
        let alice = manifest(b"alice");
        manifests.publish(&alice, b"alice").unwrap();
        let (victim, _) = manifests
            .store_slice(&alice.id, &slice("1", 7), b"alice", &slices)
            .unwrap();

        let evil = Manifest::with_slices(Hash::compute(b"evil"), 4, [victim]).unwrap();
        manifests.publish(&evil, b"mallory").unwrap();
        assert!(manifests.get(&evil.id).unwrap().unwrap().slice_hashes().is_empty());

        assert_eq!(manifests.delete(&evil.id, b"mallory", &slices).unwrap(), 0);
        assert!(slices.contains(&victim).unwrap());
        assert_eq!(manifests.referencing(&victim).unwrap(), vec![alice.id]);
    }

    #[test]
    fn test_shared_slice_kept_until_last_reference() {
        let (manifests, slices) = stores();
        let (a, b) = (manifest(b"a"), manifest(b"b"));
        manifests.publish(&a, b"alice").unwrap();
        manifests.publish(&b, b"bob").unwrap();

        let shared = slice("1", 0);
        let (hash, created) = manifests.store_slice(&a.id, &shared, b"alice", &slices).unwrap();
        assert!(created);
        let (same, created) = manifests.store_slice(&b.id, &shared, b"bob", &slices).unwrap();
        assert_eq!(same, hash);
        assert!(!created);

        assert_eq!(manifests.delete(&a.id, b"alice", &slices).unwrap(), 0);
        assert!(slices.contains(&hash).unwrap());
        assert_eq!(manifests.referencing(&hash).unwrap(), vec![b.id]);

        assert_eq!(manifests.delete(&b.id, b"bob", &slices).unwrap(), 1);
        assert!(!slices.contains(&hash).unwrap());
    }

    #[test]
    fn test_only_owner_may_modify() {
        let (manifests, slices) = stores();
        let m = manifest(b"file");
        manifests.publish(&m, b"alice").unwrap();

        assert!(matches!(manifests.publish(&m, b"mallory"), Err(StoreError::NotOwner(_))));
        assert!(matches!(
            manifests.store_slice(&m.id, &slice("1", 1), b"mallory", &slices),
            Err(StoreError::NotOwner(_))
        ));
        assert!(slices.list().unwrap().is_empty());
        assert!(matches!(
            manifests.delete(&m.id, b"mallory", &slices),
            Err(StoreError::NotOwner(_))
        ));
        assert!(manifests.contains(&m.id).unwrap());
    }

    #[test]
    fn test_length_conflict() {
        let (manifests, _) = stores();
        let m = manifest(b"file");
        manifests.publish(&m, b"alice").unwrap();

        let other = Manifest::new(m.id, 7).unwrap();
        assert!(matches!(manifests.publish(&other, b"alice"), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn test_stale_owner_record_conflicts() {
        let owners = Arc::new(MemoryContainer::new());
        let manifests = ManifestStore::new(
            Arc::new(MemoryContainer::new()),
            owners.clone(),
            Arc::new(MemoryContainer::new()),
        );
        let m = manifest(b"file");
        owners.try_add(m.id.as_bytes(), b"alice").unwrap();

        assert!(matches!(manifests.publish(&m, b"mallory"), Err(StoreError::Conflict(_))));
        assert!(!manifests.contains(&m.id).unwrap());
        assert_eq!(manifests.owner(&m.id).unwrap(), Some(b"alice".to_vec()));
    }

    #[test]
    fn test_store_slice() {
        let (manifests, slices) = stores();
        let m = manifest(b"file");
        manifests.publish(&m, b"alice").unwrap();

        let s = slice("1", 3);
        let (h, created) = manifests.store_slice(&m.id, &s, b"alice", &slices).unwrap();
        assert!(created);
        assert_eq!(h, s.compute_hash());
        manifests.store_slice(&m.id, &s, b"alice", &slices).unwrap();
        assert_eq!(manifests.get(&m.id).unwrap().unwrap().slice_hashes(), &[h]);

        let unknown = Hash::compute(b"unknown");
        assert!(matches!(
            manifests.store_slice(&unknown, &s, b"alice", &slices),
            Err(StoreError::ManifestNotFound(_))
        ));
    }

    #[test]
    fn test_failed_update_keeps_manifest() {
        let container = Arc::new(FailingAdds::default());
        let manifests = ManifestStore::new(
            container.clone(),
            Arc::new(MemoryContainer::new()),
            Arc::new(MemoryContainer::new()),
        );
        let slices = SliceStore::new(Arc::new(MemoryContainer::new()));
        let m = manifest(b"file");
        manifests.publish(&m, b"alice").unwrap();

        container.failures.store(1, Ordering::SeqCst);
        assert!(manifests.store_slice(&m.id, &slice("1", 1), b"alice", &slices).is_err());
        assert_eq!(manifests.get(&m.id).unwrap(), Some(m));
    }

    #[test]
    fn test_delete_removes_slices() {
        let (manifests, slices) = stores();
        let m = manifest(b"file");
        manifests.publish(&m, b"alice").unwrap();
        manifests.store_slice(&m.id, &slice("1", 1), b"alice", &slices).unwrap();
        manifests.store_slice(&m.id, &slice("1", 2), b"alice", &slices).unwrap();

        assert_eq!(manifests.delete(&m.id, b"alice", &slices).unwrap(), 2);
        assert!(!manifests.contains(&m.id).unwrap());
        assert_eq!(manifests.owner(&m.id).unwrap(), None);
        assert!(slices.list().unwrap().is_empty());
    }
}
