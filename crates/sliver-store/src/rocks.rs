//! RocksDB-backed container.
//!
//! Each container is one column family. Several containers can share a
//! database through [`RocksContainer::with_db`].

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rocksdb::{Direction, IteratorMode, Options, DB};
use tracing::debug;

use crate::container::Container;
use crate::StoreError;

/// Container stored in a RocksDB column family.
pub struct RocksContainer {
    db: Arc<DB>,
    column_family: String,
    /// Serialises check-then-put in `try_add`
    write_lock: Mutex<()>,
}

/// Opens (or creates) a database with the given column families.
pub fn open_db(path: &Path, column_families: &[&str]) -> Result<Arc<DB>, StoreError> {
    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts.create_missing_column_families(true);

    let db = DB::open_cf(&opts, path, column_families)
        .map_err(|e| StoreError::Database(e.to_string()))?;
    debug!(path = %path.display(), column_families = column_families.len(), "Opened database");
    Ok(Arc::new(db))
}

impl RocksContainer {
    /// Opens a database at `path` holding a single container.
    pub fn open(path: &Path, column_family: &str) -> Result<Self, StoreError> {
        let db = open_db(path, &[column_family])?;
        Ok(Self::with_db(db, column_family))
    }

    /// Uses `column_family` of an already opened database.
    pub fn with_db(db: Arc<DB>, column_family: &str) -> Self {
        Self {
            db,
            column_family: column_family.to_string(),
            write_lock: Mutex::new(()),
        }
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db.cf_handle(&self.column_family).ok_or_else(|| {
            StoreError::Database(format!("Missing {} column family", self.column_family))
        })
    }
}

impl Container for RocksContainer {
    fn try_add(&self, key: &[u8], value: &[u8]) -> Result<bool, StoreError> {
        let cf = self.cf()?;
        let _guard = self.write_lock.lock();

        let existing = self
            .db
            .get_pinned_cf(cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        if existing.is_some() {
            return Ok(false);
        }

        self.db
            .put_cf(cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(true)
    }

    fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let cf = self.cf()?;
        self.db
            .get_cf(cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn try_remove(&self, key: &[u8]) -> Result<bool, StoreError> {
        let cf = self.cf()?;
        let _guard = self.write_lock.lock();

        let existing = self
            .db
            .get_pinned_cf(cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        if existing.is_none() {
            return Ok(false);
        }

        self.db
            .delete_cf(cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(true)
    }

    fn keys(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        let cf = self.cf()?;
        let mut keys = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            keys.push(key.to_vec());
        }
        Ok(keys)
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, StoreError> {
        let cf = self.cf()?;
        let mut keys = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward)) {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key.to_vec());
        }
        Ok(keys)
    }

    fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        let cf = self.cf()?;
        self.db
            .get_pinned_cf(cf, key)
            .map(|v| v.is_some())
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}
