//! Error types for the OOXML package layer.

use std::str::Utf8Error;

/// Error reading or writing a `.docx` package.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DocxError {
    /// The zip container could not be read or written.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error.
    #[error("XML parse error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: XmlError,
    },

    /// A part the document cannot do without is absent.
    #[error("missing part: {0}")]
    MissingPart(String),

    /// A part is present but its structure is unusable.
    #[error("malformed part {part}: {message}")]
    Malformed { part: String, message: String },
}

/// Error parsing a single XML part.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum XmlError {
    #[error("{0}")]
    Parse(#[from] quick_xml::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] Utf8Error),

    #[error("attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// The part has no root element.
    #[error("no root element")]
    NoRoot,
}

impl DocxError {
    pub(crate) fn xml(part: &str, source: XmlError) -> Self {
        Self::Xml {
            part: part.to_owned(),
            source,
        }
    }

    pub(crate) fn malformed(part: &str, message: impl Into<String>) -> Self {
        Self::Malformed {
            part: part.to_owned(),
            message: message.into(),
        }
    }
}
