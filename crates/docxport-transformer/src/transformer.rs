//! Plan and description exports.

use docxport_config::{AppliesTo, Config, ConfigurationField};
use docxport_docx::Document;
use docxport_lookup::Dictionaries;
use docxport_model::{Description, FileEnvelope, Plan, Properties};
use docxport_pdf::PdfConverter;
use docxport_renderer::{Media, TemplateCompositor};
use docxport_storage::BlobStorage;
use serde::Serialize;

use crate::blueprint::PlanRenderer;
use crate::branding::{detach_branding, reattach_branding};
use crate::filename::{description_filename, plan_filename};
use crate::format::{ExportFormat, ExportVariant};
use crate::template::TemplateSource;
use crate::tokens::TokenFiller;
use crate::TransformError;

/// What this transformer offers to the host.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities<'a> {
    pub file_transformer_id: &'a str,
    pub export_variants: Vec<ExportVariant>,
    pub export_entity_types: [AppliesTo; 2],
    pub use_shared_storage: bool,
    pub configuration_fields: &'a [ConfigurationField],
}

impl<'a> Capabilities<'a> {
    pub fn from_config(config: &'a Config) -> Self {
        Self {
            file_transformer_id: &config.transformer.id,
            export_variants: ExportFormat::ALL.map(ExportFormat::variant).into(),
            export_entity_types: [AppliesTo::Plan, AppliesTo::Description],
            use_shared_storage: config.transformer.use_shared_storage,
            configuration_fields: &config.configuration_fields,
        }
    }
}

/// Renders plans and descriptions into `.docx` or PDF files.
///
/// Holds no per-render state; every export builds its own document and
/// compositor.
pub struct Transformer<'a> {
    config: &'a Config,
    dictionaries: &'a Dictionaries,
    storage: &'a dyn BlobStorage,
    pdf: &'a dyn PdfConverter,
}

impl<'a> Transformer<'a> {
    pub fn new(
        config: &'a Config,
        dictionaries: &'a Dictionaries,
        storage: &'a dyn BlobStorage,
        pdf: &'a dyn PdfConverter,
    ) -> Self {
        Self {
            config,
            dictionaries,
            storage,
            pdf,
        }
    }

    /// Export a plan with its blueprint sections and descriptions.
    ///
    /// # Errors
    ///
    /// Fails on an unknown variant, a plan without blueprint sections, an
    /// unreadable default template or a failed conversion or upload.
    pub fn export_plan(&self, plan: &Plan, variant: &str) -> Result<FileEnvelope, TransformError> {
        let format: ExportFormat = variant.parse()?;
        let docx = self.render_plan(plan)?;
        let filename = plan_filename(plan, &self.config.references.grant, format.extension());
        self.deliver(docx, format, filename)
    }

    /// Export a single description in its parent plan's context.
    ///
    /// # Errors
    ///
    /// Fails on an unknown variant, a description without its plan, an
    /// unreadable default template or a failed conversion or upload.
    pub fn export_description(
        &self,
        description: &Description,
        variant: &str,
    ) -> Result<FileEnvelope, TransformError> {
        let format: ExportFormat = variant.parse()?;
        let docx = self.render_description(description)?;
        let filename = description_filename(description, format.extension());
        self.deliver(docx, format, filename)
    }

    /// # Errors
    ///
    /// Always fails, importing is not offered.
    pub fn import_plan(&self, _file: &FileEnvelope) -> Result<Plan, TransformError> {
        Err(TransformError::NotSupported("import"))
    }

    /// # Errors
    ///
    /// Always fails, importing is not offered.
    pub fn import_description(&self, _file: &FileEnvelope) -> Result<Description, TransformError> {
        Err(TransformError::NotSupported("import"))
    }

    /// # Errors
    ///
    /// Always fails, preprocessing is not offered.
    pub fn preprocessing_plan(&self, _file: &FileEnvelope) -> Result<Plan, TransformError> {
        Err(TransformError::NotSupported("preprocessing"))
    }

    /// # Errors
    ///
    /// Always fails, preprocessing is not offered.
    pub fn preprocessing_description(
        &self,
        _file: &FileEnvelope,
    ) -> Result<Description, TransformError> {
        Err(TransformError::NotSupported("preprocessing"))
    }

    pub fn configuration(&self) -> Capabilities<'a> {
        Capabilities::from_config(self.config)
    }

    fn render_plan(&self, plan: &Plan) -> Result<Vec<u8>, TransformError> {
        let blueprint = plan
            .plan_blueprint
            .as_ref()
            .ok_or(TransformError::Required("plan blueprint"))?;
        let definition = blueprint
            .definition
            .as_ref()
            .ok_or(TransformError::Required("plan blueprint definition"))?;
        let sections = definition
            .sections
            .as_deref()
            .ok_or(TransformError::Required("plan blueprint sections"))?;

        let mut document = self.templates().load(
            &definition.plugins,
            AppliesTo::Plan,
            &self.config.templates_resolved.plan,
        )?;

        let filler = TokenFiller::new(plan, self.dictionaries.languages());
        filler.fill_first_page(&mut document);

        let branding = detach_branding(&mut document.body);
        let compositor = self.compositor(&document);
        PlanRenderer::new(plan, &self.config.references, compositor).render(
            &mut document.resources,
            &mut document.body,
            sections,
        );
        reattach_branding(&mut document.body, branding.unwrap_or_default());

        filler.fill_footers(&mut document);
        filler.fill_headers(&mut document);

        Ok(document.to_bytes()?)
    }

    fn render_description(&self, description: &Description) -> Result<Vec<u8>, TransformError> {
        let plan = description
            .plan
            .as_deref()
            .ok_or(TransformError::Required("plan"))?;
        let definition = description
            .description_template
            .as_ref()
            .and_then(|template| template.definition.as_ref());
        let plugins = definition.map_or(&[][..], |definition| &definition.plugins[..]);

        let mut document = self.templates().load(
            plugins,
            AppliesTo::Description,
            &self.config.templates_resolved.description,
        )?;

        let filler =
            TokenFiller::new(plan, self.dictionaries.languages()).with_description(description);
        filler.fill_first_page(&mut document);
        filler.fill_footers(&mut document);
        filler.fill_headers(&mut document);

        let branding = detach_branding(&mut document.body);
        match definition {
            Some(definition) => {
                let empty = Properties::default();
                let properties = description.properties.as_ref().unwrap_or(&empty);
                self.compositor(&document).compose(
                    &mut document.resources,
                    &mut document.body,
                    &definition.pages,
                    properties,
                    &description.visibility(),
                );
            }
            None => tracing::error!(
                description = ?description.id,
                "Description has no template definition"
            ),
        }
        reattach_branding(&mut document.body, branding.unwrap_or_default());

        Ok(document.to_bytes()?)
    }

    fn templates(&self) -> TemplateSource<'a> {
        TemplateSource::new(
            &self.config.transformer.id,
            &self.config.configuration_fields,
            self.storage,
        )
    }

    fn compositor(&self, document: &Document) -> TemplateCompositor<'a> {
        let media = Media::new(document.geometry().content_box_pt()).with_storage(self.storage);
        TemplateCompositor::new(
            &self.config.references,
            self.dictionaries.pid_links(),
            media,
        )
    }

    fn deliver(
        &self,
        docx: Vec<u8>,
        format: ExportFormat,
        filename: String,
    ) -> Result<FileEnvelope, TransformError> {
        let bytes = match format {
            ExportFormat::Docx => docx,
            ExportFormat::Pdf => self.pdf.convert(&docx)?,
        };
        let size = bytes.len();

        let mut envelope = if self.config.transformer.use_shared_storage {
            let reference = self.storage.store(&bytes)?;
            FileEnvelope::stored(filename, reference)
        } else {
            FileEnvelope::inline(filename, bytes)
        };
        envelope.mime_type = Some(format.mime_type().to_owned());

        tracing::info!(
            filename = envelope.display_name().unwrap_or_default(),
            format = format.as_str(),
            bytes = size,
            shared = envelope.storage_ref().is_some(),
            "Exported file"
        );
        Ok(envelope)
    }
}
