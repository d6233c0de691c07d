//! Error types for rendering.

use docxport_storage::StorageError;

/// Error while rendering a single piece of content.
///
/// The compositor logs these and carries on with the next field or page.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Uploaded file could not be read from blob storage.
    #[error("storage error")]
    Storage(#[from] StorageError),

    /// Image bytes could not be decoded.
    #[error("image decode error")]
    Image(#[from] image::ImageError),

    /// I/O error while sniffing image bytes.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Upload value carries neither bytes nor a usable reference.
    #[error("no file content for {0}")]
    MissingFile(String),

    /// Image has a zero dimension.
    #[error("image {0} has no area")]
    EmptyImage(String),
}
