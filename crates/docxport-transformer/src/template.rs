//! Template selection.
//!
//! A blueprint or description template may attach a file-transformer plugin
//! whose fields carry a custom `.docx` template. Otherwise, or when the
//! custom template cannot be used, the configured default is loaded.

use std::path::Path;

use docxport_config::{AppliesTo, ConfigurationField};
use docxport_docx::Document;
use docxport_model::{Plugin, PluginType};
use docxport_storage::BlobStorage;

use crate::TransformError;

/// Resolves the template an export starts from.
pub struct TemplateSource<'a> {
    transformer_id: &'a str,
    fields: &'a [ConfigurationField],
    storage: &'a dyn BlobStorage,
}

impl<'a> TemplateSource<'a> {
    pub fn new(
        transformer_id: &'a str,
        fields: &'a [ConfigurationField],
        storage: &'a dyn BlobStorage,
    ) -> Self {
        Self {
            transformer_id,
            fields,
            storage,
        }
    }

    /// Custom template from `plugins` when one applies to `kind`, the
    /// default template at `default_path` otherwise.
    ///
    /// Only a missing or unreadable default template is an error.
    pub fn load(
        &self,
        plugins: &[Plugin],
        kind: AppliesTo,
        default_path: &Path,
    ) -> Result<Document, TransformError> {
        if !plugins.is_empty() {
            match self.custom(plugins, kind) {
                Ok(Some(document)) => {
                    tracing::debug!(?kind, "Using custom template");
                    return Ok(document);
                }
                Ok(None) => {}
                Err(error) => tracing::warn!(
                    ?kind,
                    error = %error,
                    "Failed to load custom template, falling back to default"
                ),
            }
        }

        let bytes = std::fs::read(default_path).map_err(|source| TransformError::Template {
            path: default_path.to_path_buf(),
            source,
        })?;
        Ok(Document::from_bytes(&bytes)?)
    }

    fn custom(&self, plugins: &[Plugin], kind: AppliesTo) -> Result<Option<Document>, TransformError> {
        let Some(plugin) = plugins.iter().find(|plugin| {
            plugin.code == self.transformer_id && plugin.plugin_type == PluginType::FileTransformer
        }) else {
            return Ok(None);
        };

        let codes: Vec<&str> = self
            .fields
            .iter()
            .filter(|field| field.applies_to.contains(&kind))
            .map(|field| field.code.as_str())
            .collect();
        let Some(file) = plugin
            .fields
            .iter()
            .filter(|field| codes.contains(&field.code.as_str()))
            .find_map(|field| field.file.as_ref())
        else {
            return Ok(None);
        };

        let bytes = match (file.file.as_ref().filter(|b| !b.is_empty()), file.storage_ref()) {
            (Some(bytes), _) => bytes.clone(),
            (None, Some(reference)) => self.storage.read(reference)?,
            (None, None) => return Ok(None),
        };
        Ok(Some(Document::from_bytes(&bytes)?))
    }
}
