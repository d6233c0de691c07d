//! Filesystem blob storage.

use std::fs;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::storage::{BlobStorage, StorageError, StorageErrorKind};

const BACKEND: &str = "Fs";

/// Stores blobs as files named by random UUIDs under a root directory.
#[derive(Debug, Clone)]
pub struct FsBlobStorage {
    root: PathBuf,
}

impl FsBlobStorage {
    /// Create a storage rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference to a path inside the root.
    ///
    /// Rejects empty references, absolute paths and any `..` component.
    fn resolve(&self, reference: &str) -> Result<PathBuf, StorageError> {
        let path = Path::new(reference);
        let valid = !reference.trim().is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(StorageError::new(StorageErrorKind::InvalidReference)
                .with_reference(reference)
                .with_backend(BACKEND));
        }
        Ok(self.root.join(path))
    }
}

impl BlobStorage for FsBlobStorage {
    fn store(&self, data: &[u8]) -> Result<String, StorageError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| StorageError::io(e, &self.root).with_backend(BACKEND))?;

        let reference = Uuid::new_v4().simple().to_string();
        let path = self.root.join(&reference);
        fs::write(&path, data).map_err(|e| {
            StorageError::io(e, &path)
                .with_reference(reference.clone())
                .with_backend(BACKEND)
        })?;

        tracing::debug!(reference, bytes = data.len(), "Stored blob");
        Ok(reference)
    }

    fn read(&self, reference: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(reference)?;
        fs::read(&path).map_err(|e| {
            StorageError::io(e, &path)
                .with_reference(reference)
                .with_backend(BACKEND)
        })
    }
}
