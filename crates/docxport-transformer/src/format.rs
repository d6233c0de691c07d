//! Export variants.

use std::str::FromStr;

use serde::Serialize;

use crate::TransformError;

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl ExportFormat {
    /// Every format, in the order they are advertised.
    pub const ALL: [Self; 2] = [Self::Pdf, Self::Docx];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    /// Filename extension including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Docx => ".docx",
            Self::Pdf => ".pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pdf => "application/pdf",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Docx => "fa-file-word-o",
            Self::Pdf => "fa-file-pdf-o",
        }
    }

    /// How the host lists this format.
    pub fn variant(self) -> ExportVariant {
        ExportVariant {
            format: self.as_str().to_owned(),
            selected: true,
            icon: self.icon().to_owned(),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = TransformError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            _ => Err(TransformError::InvalidType(value.to_owned())),
        }
    }
}

/// Export variant entry of the transformer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportVariant {
    pub format: String,
    pub selected: bool,
    pub icon: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_variants() {
        assert_eq!("docx".parse::<ExportFormat>().unwrap(), ExportFormat::Docx);
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
    }

    #[test]
    fn test_unknown_variant_is_invalid_type() {
        let err = "odt".parse::<ExportFormat>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid type odt");
    }

    #[test]
    fn test_variant_entry() {
        assert_eq!(
            ExportFormat::Pdf.variant(),
            ExportVariant {
                format: "pdf".to_owned(),
                selected: true,
                icon: "fa-file-pdf-o".to_owned(),
            }
        );
        assert_eq!(ExportFormat::Docx.extension(), ".docx");
    }
}
