//! The database module
//! Provide CRUD methods for the vector store

use crate::error::{DbError, Result};
use crate::persist::{FileBackend, MemoryBackend, Persistence};
use crate::record::{validate_values, SearchResult, VectorRecord};
use crate::search;
use parking_lot::RwLock;
use std::path::Path;
use tracing::debug;

/// Thread-safe vector store.
///
/// All mutations take an exclusive lock over the record table; lookups,
/// enumeration and search share it. A search therefore never observes a
/// half-applied insert, update or delete.
pub struct VecDB {
    backend: RwLock<Box<dyn Persistence>>,
}

impl VecDB {
    /// Creates a new empty, in-memory vector database.
    ///
    /// # Examples
    ///
    /// ```
    /// use lvdb::VecDB;
    ///
    /// let db = VecDB::new();
    /// assert_eq!(db.count(), 0);
    /// ```
    pub fn new() -> VecDB {
        VecDB::with_backend(MemoryBackend::new())
    }

    /// Opens the log file at `path` (creating it if missing) and loads every
    /// record it holds. Every later mutation is synced to that file before
    /// it reports success.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lvdb::VecDB;
    ///
    /// let db = VecDB::open("vectors.db").unwrap();
    /// println!("Loaded {} vectors", db.count());
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<VecDB> {
        Ok(VecDB::with_backend(FileBackend::open(path)?))
    }

    /// Wraps any persistence backend.
    pub fn with_backend(backend: impl Persistence + 'static) -> VecDB {
        VecDB { backend: RwLock::new(Box::new(backend)) }
    }

    /// Stores a new vector and returns the id assigned to it.
    ///
    /// No dimension check is made against records already stored.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - the vector is empty or holds a non-finite component
    /// * `Persistence` - the backend failed to record the write
    ///
    /// # Examples
    ///
    /// ```
    /// use lvdb::VecDB;
    ///
    /// let db = VecDB::new();
    /// let first = db.insert(vec![1.0, 0.0]).unwrap();
    /// let second = db.insert(vec![0.0, 1.0, 0.0]).unwrap();
    /// assert_ne!(first, second);
    ///
    /// assert!(db.insert(vec![]).is_err());
    /// ```
    pub fn insert(&self, values: Vec<f64>) -> Result<u64> {
        validate_values(&values)?;

        let mut backend = self.backend.write();
        let id = backend.allocate_id()?;
        backend.put(&VectorRecord { id, values })?;

        debug!(id, "inserted vector");
        Ok(id)
    }

    /// Inserts each vector independently, in order.
    ///
    /// A failing element does not stop the rest and nothing is rolled back;
    /// the returned list holds one outcome per input.
    pub fn insert_batch(&self, batch: Vec<Vec<f64>>) -> Vec<Result<u64>> {
        batch.into_iter().map(|values| self.insert(values)).collect()
    }

    /// Replaces the values stored under `id`.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - the new vector is empty or not finite
    /// * `NotFound` - no record has this id
    /// * `Persistence` - the backend failed to record the write
    ///
    /// # Examples
    ///
    /// ```
    /// use lvdb::VecDB;
    ///
    /// let db = VecDB::new();
    /// let id = db.insert(vec![1.0, 0.0]).unwrap();
    ///
    /// db.update(id, vec![0.0, 1.0, 1.0]).unwrap();
    /// assert_eq!(db.get(id).unwrap().values, vec![0.0, 1.0, 1.0]);
    ///
    /// assert!(db.update(id + 1, vec![1.0]).is_err());
    /// ```
    pub fn update(&self, id: u64, values: Vec<f64>) -> Result<()> {
        validate_values(&values)?;

        let mut backend = self.backend.write();
        if backend.get(id)?.is_none() {
            return Err(DbError::NotFound(id));
        }
        backend.put(&VectorRecord { id, values })?;

        debug!(id, "updated vector");
        Ok(())
    }

    /// Removes the record with this id.
    ///
    /// Returns `Ok(false)` when there was nothing to delete; that is not an
    /// error.
    ///
    /// # Examples
    ///
    /// ```
    /// use lvdb::VecDB;
    ///
    /// let db = VecDB::new();
    /// let id = db.insert(vec![1.0, 2.0]).unwrap();
    ///
    /// assert!(db.delete(id).unwrap());
    /// assert!(!db.delete(id).unwrap());
    /// ```
    pub fn delete(&self, id: u64) -> Result<bool> {
        let deleted = self.backend.write().delete(id)?;

        debug!(id, deleted, "delete vector");
        Ok(deleted)
    }

    /// Retrieves a copy of the record with this id.
    pub fn get(&self, id: u64) -> Result<VectorRecord> {
        self.backend.read().get(id)?.ok_or(DbError::NotFound(id))
    }

    /// Returns a consistent snapshot of every record, in ascending id order.
    ///
    /// # Examples
    ///
    /// ```
    /// use lvdb::VecDB;
    ///
    /// let db = VecDB::new();
    /// db.insert(vec![1.0, 0.0]).unwrap();
    /// db.insert(vec![0.0, 1.0]).unwrap();
    ///
    /// let all = db.get_all().unwrap();
    /// assert_eq!(all.len(), 2);
    /// assert!(all[0].id < all[1].id);
    /// ```
    pub fn get_all(&self) -> Result<Vec<VectorRecord>> {
        let records = self.backend.read().scan_all()?;

        debug!(total = records.len(), "enumerated vectors");
        Ok(records)
    }

    /// Returns the number of vectors in the database.
    pub fn count(&self) -> usize {
        self.backend.read().len()
    }

    /// Returns the `top_k` records most similar to `query` by cosine
    /// similarity, best first. See [`search::search`].
    ///
    /// # Examples
    ///
    /// ```
    /// use lvdb::VecDB;
    ///
    /// let db = VecDB::new();
    /// db.insert(vec![1.0, 0.0]).unwrap();
    /// db.insert(vec![0.0, 1.0]).unwrap();
    /// db.insert(vec![1.0, 1.0]).unwrap();
    ///
    /// let results = db.search(&[1.0, 0.0], 2).unwrap();
    /// let ids: Vec<u64> = results.iter().map(|r| r.record.id).collect();
    /// assert_eq!(ids, vec![1, 3]);
    /// ```
    pub fn search(&self, query: &[f64], top_k: usize) -> Result<Vec<SearchResult>> {
        search::search(self, query, top_k)
    }

    /// Asks the backend to reclaim space held by dead records.
    pub fn compact(&self) -> Result<()> {
        self.backend.write().compact()
    }
}

impl Default for VecDB {
    fn default() -> Self {
        Self::new()
    }
}
