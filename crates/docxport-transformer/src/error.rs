//! Error types for exports.

use std::path::PathBuf;

use docxport_docx::DocxError;
use docxport_pdf::PdfError;
use docxport_storage::StorageError;

/// Error returned by [`Transformer`](crate::Transformer) operations.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// A required input is missing from the payload.
    #[error("{0} required")]
    Required(&'static str),

    /// Operation this transformer does not offer.
    #[error("{0} not supported")]
    NotSupported(&'static str),

    /// Unknown export variant.
    #[error("Invalid type {0}")]
    InvalidType(String),

    /// Default template file could not be read.
    #[error("Failed to read template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template or output package error.
    #[error(transparent)]
    Docx(#[from] DocxError),

    /// PDF conversion failed.
    #[error("PDF conversion failed: {0}")]
    Pdf(#[from] PdfError),

    /// Exported file could not be stored.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
