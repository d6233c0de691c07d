//! Content rendering for docxport.
//!
//! Everything that turns plan and description data into document blocks:
//!
//! - [`TemplateCompositor`] walks description templates and their values
//! - [`insert_html`] converts rich text into paragraphs, lists and links
//! - [`replace_token`] fills placeholder tokens that Word split across runs
//! - [`Media`] reads uploaded files and embeds them as captioned pictures
//!
//! Rendering never fails as a whole: a field that cannot be rendered is
//! logged and replaced by a textual fallback.

mod compositor;
mod error;
mod measure;
mod placeholder;
mod rich_text;

pub use compositor::{TemplateCompositor, extract_values};
pub use error::RenderError;
pub use measure::{IMAGE_MIME_TYPES, Media, fit_image, is_image_mime, pixel_size, points_to_emu};
pub use placeholder::{TextPos, TokenSpan, contains_token, find_token, replace_token};
pub use rich_text::{INDENT_STEP, Insertion, insert_html, prepare_html};
