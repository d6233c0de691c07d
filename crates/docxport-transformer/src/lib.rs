//! Plan and description export for docxport.
//!
//! The [`Transformer`] loads a `.docx` template, fills its placeholder
//! tokens, appends the rendered plan or description and returns the result
//! as a `.docx` or converted PDF file.
//!
//! # Example
//!
//! ```ignore
//! use docxport_transformer::Transformer;
//!
//! let transformer = Transformer::new(&config, &dictionaries, &storage, &pdf);
//! let file = transformer.export_plan(&plan, "pdf")?;
//! ```

mod blueprint;
mod branding;
mod error;
mod filename;
mod format;
mod template;
mod tokens;
mod transformer;

pub use blueprint::{PlanRenderer, format_number};
pub use branding::{detach_branding, find_branding, reattach_branding};
pub use error::TransformError;
pub use filename::{description_filename, plan_filename};
pub use format::{ExportFormat, ExportVariant};
pub use template::TemplateSource;
pub use tokens::{TokenFiller, extract_codes, reference_codes};
pub use transformer::{Capabilities, Transformer};
