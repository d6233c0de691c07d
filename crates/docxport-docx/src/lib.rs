//! OOXML package layer for docxport.
//!
//! Reads a `.docx` template into a typed, editable [`Document`] and writes it
//! back. Content the engine does not model (styles, settings, unknown
//! elements) is preserved verbatim.
//!
//! # Quick start
//!
//! ```
//! use docxport_docx::{Document, Paragraph, Run};
//!
//! let mut document = Document::new();
//! document
//!     .body
//!     .push(Paragraph::styled("Heading1").with_run(Run::text_run("1. Summary")).into());
//! let bytes = document.to_bytes().unwrap();
//! assert!(Document::from_bytes(&bytes).is_ok());
//! ```

mod block;
mod content_types;
mod document;
mod drawing;
mod error;
mod geometry;
mod numbering;
mod package;
mod paragraph;
mod props;
mod relationships;
pub mod xml;

pub use block::{Block, Cell, Row, Table};
pub use content_types::ContentTypes;
pub use document::{Document, HeaderFooter, HeaderFooterKind, Resources};
pub use drawing::{EMU_PER_POINT, InlinePicture};
pub use error::{DocxError, XmlError};
pub use geometry::PageGeometry;
pub use numbering::{ListKind, Numbering};
pub use package::Package;
pub use paragraph::{BreakKind, Hyperlink, Inline, Paragraph, Run, RunContent};
pub use props::{Justification, ParagraphProps, RunProps, VerticalAlign};
pub use relationships::{REL_HYPERLINK, REL_IMAGE, Relationship, Relationships};
