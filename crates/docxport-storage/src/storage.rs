//! Blob storage trait and error types.
//!
//! Provides the [`BlobStorage`] trait for persisting exported files and
//! reading uploaded ones, along with [`StorageError`] for unified error
//! handling across backends.
//!
//! # Reference Convention
//!
//! A file reference is the opaque string returned by [`BlobStorage::store`].
//! Backends map references to their internal layout; callers never build
//! references themselves.

use std::path::PathBuf;

/// Semantic error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Referenced blob does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Reference is empty or escapes the storage root.
    InvalidReference,
    /// Backend is not reachable or not writable.
    Unavailable,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    kind: StorageErrorKind,
    reference: Option<String>,
    path: Option<PathBuf>,
    backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            reference: None,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Semantic category of the error.
    #[must_use]
    pub fn kind(&self) -> StorageErrorKind {
        self.kind
    }

    /// File reference the operation was given, if any.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    /// Backend identifier (e.g., "Fs", "Mock").
    #[must_use]
    pub fn backend(&self) -> Option<&'static str> {
        self.backend
    }

    /// Attach the file reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a not found error for a reference.
    #[must_use]
    pub fn not_found(reference: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_reference(reference)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::ReadOnlyFilesystem | std::io::ErrorKind::StorageFull => {
                StorageErrorKind::Unavailable
            }
            _ => StorageErrorKind::Other,
        };
        Self::new(kind).with_path(path).with_source(err)
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: source (reference: abc)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::InvalidReference => "Invalid reference",
            StorageErrorKind::Unavailable => "Unavailable",
            StorageErrorKind::Other => "Error",
        };
        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        if let Some(reference) = &self.reference {
            write!(f, " (reference: {reference})")?;
        } else if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Blob storage shared with the host application.
///
/// Exports are written here when shared storage is enabled, and uploaded
/// files are read back by reference.
pub trait BlobStorage: Send + Sync {
    /// Persist bytes and return a reference that [`read`](Self::read) accepts.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the blob cannot be written.
    fn store(&self, data: &[u8]) -> Result<String, StorageError>;

    /// Read the bytes behind a reference.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the reference is invalid or the blob is missing.
    fn read(&self, reference: &str) -> Result<Vec<u8>, StorageError>;
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_storage_error_new() {
        let err = StorageError::new(StorageErrorKind::NotFound);

        assert_eq!(err.kind(), StorageErrorKind::NotFound);
        assert!(err.reference().is_none());
        assert!(err.path().is_none());
        assert!(err.backend().is_none());
    }

    #[test]
    fn test_storage_error_display_with_reference() {
        let err = StorageError::not_found("abc").with_backend("Fs");
        assert_eq!(err.to_string(), "[Fs] Not found (reference: abc)");
    }

    #[test]
    fn test_storage_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::io(io, "/data/blob");

        assert_eq!(err.kind(), StorageErrorKind::PermissionDenied);
        assert_eq!(err.path(), Some(Path::new("/data/blob")));
        assert_eq!(err.to_string(), "Permission denied: denied (path: /data/blob)");
        assert!(std::error::Error::source(&err).is_some());
    }
}
