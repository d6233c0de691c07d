//! PDF conversion over HTTP.
//!
//! Converts rendered `.docx` bytes to PDF by posting them to a
//! LibreOffice-backed conversion service (`/forms/libreoffice/convert`).
//! The call is synchronous and is not retried.

use std::time::Duration;

use docxport_config::PdfConfig;
use ureq::Agent;
use uuid::Uuid;

const CONVERT_PATH: &str = "/forms/libreoffice/convert";
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Error from the PDF conversion service.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    HttpRequest(#[from] ureq::Error),

    /// Service returned an error status.
    #[error("HTTP error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// Converted document exceeds the configured size limit.
    #[error("PDF response exceeds {limit} bytes")]
    TooLarge { limit: u64 },
}

/// Converts `.docx` bytes into PDF bytes.
pub trait PdfConverter: Send + Sync {
    /// # Errors
    ///
    /// Returns [`PdfError`] when the conversion does not produce a document.
    fn convert(&self, docx: &[u8]) -> Result<Vec<u8>, PdfError>;
}

/// Client for the conversion service.
pub struct PdfClient {
    agent: Agent,
    base_url: String,
    max_response_bytes: u64,
}

impl PdfClient {
    #[must_use]
    pub fn from_config(config: &PdfConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: config.url.trim_end_matches('/').to_owned(),
            max_response_bytes: config.max_response_bytes,
        }
    }

    fn convert_url(&self) -> String {
        format!("{}{CONVERT_PATH}", self.base_url)
    }
}

impl PdfConverter for PdfClient {
    fn convert(&self, docx: &[u8]) -> Result<Vec<u8>, PdfError> {
        let boundary = format!("----DocxportBoundary{}", Uuid::new_v4().simple());
        let filename = format!("{}.docx", Uuid::new_v4());
        let body = multipart_body(&boundary, "files", &filename, DOCX_CONTENT_TYPE, docx);

        tracing::debug!(url = %self.convert_url(), bytes = docx.len(), "Converting to PDF");

        let response = self
            .agent
            .post(&self.convert_url())
            .header(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .send(&body[..])?;

        let status = response.status().as_u16();
        let mut body_reader = response.into_body();

        if status >= 400 {
            let error_body = body_reader
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_owned());
            return Err(PdfError::HttpResponse {
                status,
                body: error_body,
            });
        }

        let pdf = body_reader
            .with_config()
            .limit(self.max_response_bytes)
            .read_to_vec()
            .map_err(|e| match e {
                ureq::Error::BodyExceedsLimit(_) => PdfError::TooLarge {
                    limit: self.max_response_bytes,
                },
                other => PdfError::HttpRequest(other),
            })?;

        tracing::info!(bytes = pdf.len(), "Converted document to PDF");
        Ok(pdf)
    }
}

/// Build a single-part `multipart/form-data` body.
fn multipart_body(
    boundary: &str,
    name: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
