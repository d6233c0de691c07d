//! Mock blob storage for testing.
//!
//! Provides [`MockBlobStorage`] for unit testing without filesystem access.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::storage::{BlobStorage, StorageError, StorageErrorKind};

const BACKEND: &str = "Mock";

/// In-memory blob storage.
///
/// Use the builder methods to seed blobs, and [`stored`](Self::stored) to
/// inspect what an export wrote.
///
/// # Example
///
/// ```ignore
/// use docxport_storage::{BlobStorage, MockBlobStorage};
///
/// let storage = MockBlobStorage::new().with_blob("logo", b"png".to_vec());
/// assert_eq!(storage.read("logo").unwrap(), b"png");
/// ```
#[derive(Debug, Default)]
pub struct MockBlobStorage {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    counter: RwLock<u32>,
    fail_writes: bool,
}

impl MockBlobStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob under a fixed reference.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_blob(self, reference: impl Into<String>, data: Vec<u8>) -> Self {
        self.blobs.write().unwrap().insert(reference.into(), data);
        self
    }

    /// Make every `store` call fail with [`StorageErrorKind::Unavailable`].
    #[must_use]
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Bytes stored under a reference.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn stored(&self, reference: &str) -> Option<Vec<u8>> {
        self.blobs.read().unwrap().get(reference).cloned()
    }
}

impl BlobStorage for MockBlobStorage {
    fn store(&self, data: &[u8]) -> Result<String, StorageError> {
        if self.fail_writes {
            return Err(StorageError::new(StorageErrorKind::Unavailable).with_backend(BACKEND));
        }
        let mut counter = self.counter.write().unwrap();
        *counter += 1;
        let reference = format!("blob-{counter}");
        self.blobs
            .write()
            .unwrap()
            .insert(reference.clone(), data.to_vec());
        Ok(reference)
    }

    fn read(&self, reference: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .read()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| StorageError::not_found(reference).with_backend(BACKEND))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_read() {
        let storage = MockBlobStorage::new();
        let reference = storage.store(b"abc").unwrap();

        assert_eq!(reference, "blob-1");
        assert_eq!(storage.read(&reference).unwrap(), b"abc");
        assert_eq!(storage.stored(&reference), Some(b"abc".to_vec()));
    }

    #[test]
    fn test_seeded_blob() {
        let storage = MockBlobStorage::new().with_blob("logo", vec![1, 2]);
        assert_eq!(storage.read("logo").unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_missing_blob() {
        let err = MockBlobStorage::new().read("nope").unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::NotFound);
        assert_eq!(err.backend(), Some("Mock"));
    }

    #[test]
    fn test_failing_writes() {
        let err = MockBlobStorage::new().failing_writes().store(b"x").unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::Unavailable);
    }
}
