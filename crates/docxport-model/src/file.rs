use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A file carried either inline or as a blob storage reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileEnvelope {
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    /// Inline bytes, base64 on the wire.
    #[serde(
        serialize_with = "serialize_bytes",
        deserialize_with = "deserialize_bytes",
        skip_serializing_if = "Option::is_none"
    )]
    pub file: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_ref: Option<String>,
}

impl FileEnvelope {
    /// Envelope holding inline bytes.
    #[must_use]
    pub fn inline(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: Some(filename.into()),
            mime_type: None,
            file: Some(bytes),
            file_ref: None,
        }
    }

    /// Envelope holding a storage reference.
    #[must_use]
    pub fn stored(filename: impl Into<String>, file_ref: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            mime_type: None,
            file: None,
            file_ref: Some(file_ref.into()),
        }
    }

    /// Filename when present and not blank.
    pub fn display_name(&self) -> Option<&str> {
        self.filename.as_deref().filter(|name| !name.trim().is_empty())
    }

    /// Storage reference when present and not blank.
    pub fn storage_ref(&self) -> Option<&str> {
        self.file_ref.as_deref().filter(|r| !r.trim().is_empty())
    }
}

#[allow(clippy::ref_option)]
fn serialize_bytes<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
        None => serializer.serialize_none(),
    }
}

fn deserialize_bytes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
    let encoded: Option<String> = Option::deserialize(deserializer)?;
    encoded
        .map(|s| STANDARD.decode(s.trim()).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_inline_file() {
        let json = r#"{"filename":"logo.png","mimeType":"image/png","file":"iVBORw=="}"#;
        let envelope: FileEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.filename.as_deref(), Some("logo.png"));
        assert_eq!(envelope.mime_type.as_deref(), Some("image/png"));
        assert_eq!(envelope.file, Some(vec![0x89, 0x50, 0x4e, 0x47]));
        assert!(envelope.file_ref.is_none());
    }

    #[test]
    fn test_serialize_stored_file_omits_bytes() {
        let envelope = FileEnvelope::stored("plan.docx", "abc-123");
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(
            json,
            r#"{"filename":"plan.docx","mimeType":null,"fileRef":"abc-123"}"#
        );
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let json = r#"{"file":"not base64!"}"#;
        assert!(serde_json::from_str::<FileEnvelope>(json).is_err());
    }

    #[test]
    fn test_blank_names_are_ignored() {
        let envelope = FileEnvelope {
            filename: Some("  ".to_owned()),
            file_ref: Some(String::new()),
            ..FileEnvelope::default()
        };
        assert!(envelope.display_name().is_none());
        assert!(envelope.storage_ref().is_none());
    }
}
