//! Blob storage abstraction for the docxport engine.
//!
//! Exports can be handed back to the host application through shared
//! storage instead of inline bytes, and uploaded files referenced from plan
//! and description values are read from the same place.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`BlobStorage`] trait with `store()` and `read()` methods
//! - [`FsBlobStorage`] implementation backed by a directory
//! - [`MockBlobStorage`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use docxport_storage::{BlobStorage, FsBlobStorage};
//!
//! let storage = FsBlobStorage::new(PathBuf::from("/var/lib/docxport"));
//! let reference = storage.store(&bytes)?;
//! assert_eq!(storage.read(&reference)?, bytes);
//! ```

mod fs;
#[cfg(feature = "mock")]
mod mock;
mod storage;

pub use fs::FsBlobStorage;
#[cfg(feature = "mock")]
pub use mock::MockBlobStorage;
pub use storage::{BlobStorage, StorageError, StorageErrorKind};
