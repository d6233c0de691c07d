//! Image measurement and embedding.
//!
//! Pixels convert to points at 0.75 and points to EMU at 12 700. An image is
//! first scaled to the content width; when that makes it taller than the
//! content box it is scaled to the content height instead.

use std::io::Cursor;

use docxport_docx::{EMU_PER_POINT, Justification, Paragraph, Resources, Run, RunContent};
use docxport_model::FileEnvelope;
use docxport_storage::BlobStorage;
use image::ImageReader;

use crate::RenderError;

const POINTS_PER_PIXEL: f64 = 0.75;

/// MIME types that are embedded as pictures.
pub const IMAGE_MIME_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/tiff",
    "image/bmp",
    "image/wmf",
];

pub fn is_image_mime(mime: &str) -> bool {
    IMAGE_MIME_TYPES.contains(&mime)
}

/// Fit an image of `pixels` into `content_box` (points). Returns the size in points.
///
/// Returns `None` when either pixel dimension is zero.
#[allow(clippy::cast_possible_truncation)]
pub fn fit_image(pixels: (u32, u32), content_box: (i64, i64)) -> Option<(i64, i64)> {
    let (px_width, px_height) = pixels;
    if px_width == 0 || px_height == 0 {
        return None;
    }
    let (content_width, content_height) = content_box;
    let ratio = f64::from(px_height) / f64::from(px_width);

    let mut width = ((f64::from(px_width) * POINTS_PER_PIXEL).round() as i64).min(content_width);
    let mut height = (width as f64 * ratio).round() as i64;
    if height > content_height {
        height = ((f64::from(px_height) * POINTS_PER_PIXEL).round() as i64).min(content_height);
        width = (height as f64 / ratio).round() as i64;
    }
    Some((width, height))
}

/// Pixel dimensions read from the image header.
pub fn pixel_size(bytes: &[u8]) -> Result<(u32, u32), RenderError> {
    Ok(ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?)
}

pub fn points_to_emu(points: i64) -> i64 {
    points * EMU_PER_POINT
}

fn extension_for(mime: &str) -> &str {
    mime.rsplit('/').next().unwrap_or("png")
}

/// Uploaded file access and picture embedding, with the running image number.
///
/// One instance serves a whole export so captions number consecutively.
pub struct Media<'a> {
    storage: Option<&'a dyn BlobStorage>,
    content_box: (i64, i64),
    image_count: u32,
}

impl<'a> Media<'a> {
    /// Media reading inline bytes only, fitting pictures into `content_box` points.
    #[must_use]
    pub fn new(content_box: (i64, i64)) -> Self {
        Self {
            storage: None,
            content_box,
            image_count: 0,
        }
    }

    /// Read files from shared storage when the envelope carries a reference.
    #[must_use]
    pub fn with_storage(mut self, storage: &'a dyn BlobStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Number of pictures embedded so far.
    pub fn image_count(&self) -> u32 {
        self.image_count
    }

    /// Bytes of an uploaded file.
    pub fn file_bytes(&self, envelope: &FileEnvelope) -> Result<Vec<u8>, RenderError> {
        if let (Some(storage), Some(reference)) = (self.storage, envelope.storage_ref()) {
            return Ok(storage.read(reference)?);
        }
        envelope
            .file
            .clone()
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| {
                RenderError::MissingFile(envelope.display_name().unwrap_or_default().to_owned())
            })
    }

    /// Embed an uploaded picture: a centred image paragraph and its caption.
    ///
    /// The caption number only advances when the picture was embedded.
    pub fn picture(
        &mut self,
        resources: &mut Resources,
        envelope: &FileEnvelope,
    ) -> Result<[Paragraph; 2], RenderError> {
        let name = envelope.display_name().unwrap_or("image").to_owned();
        let bytes = self.file_bytes(envelope)?;
        let pixels = pixel_size(&bytes)?;
        let (width, height) =
            fit_image(pixels, self.content_box).ok_or_else(|| RenderError::EmptyImage(name.clone()))?;

        let mime = envelope.mime_type.as_deref().unwrap_or("image/png");
        let drawing = resources.inline_image(
            bytes,
            extension_for(mime),
            mime,
            &name,
            (points_to_emu(width), points_to_emu(height)),
        );

        let mut image = Paragraph::new();
        image.props.set_justification(Justification::Center);
        image.props.set_spacing(None, Some(0));
        image.push_run(Run {
            content: vec![RunContent::Drawing(drawing)],
            ..Run::default()
        });

        self.image_count += 1;
        let mut caption = Paragraph::styled("Caption");
        caption.props.set_justification(Justification::Center);
        caption.props.set_spacing(Some(0), None);
        caption.push_run(Run::text_run(format!("Image {}", self.image_count)));

        tracing::debug!(name, width, height, "Embedded picture");
        Ok([image, caption])
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::RgbImage::new(width, height)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
