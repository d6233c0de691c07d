//! `docxport export-plan` and `docxport export-description` implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use docxport_lookup::Dictionaries;
use docxport_model::{Description, FileEnvelope, Plan};
use docxport_pdf::PdfClient;
use docxport_storage::FsBlobStorage;
use docxport_transformer::Transformer;

use crate::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Entity an export command reads from its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExportKind {
    Plan,
    Description,
}

/// Arguments for the export commands.
#[derive(Args)]
pub(crate) struct ExportArgs {
    /// JSON payload as sent by the host application.
    input: PathBuf,

    /// Output variant: docx or pdf.
    #[arg(long, default_value = "docx")]
    variant: String,

    /// Where to write the file (default: the export filename in the current directory).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ExportArgs {
    /// Execute the export command.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be read or the export fails.
    pub(crate) fn execute(self, global: &GlobalArgs, kind: ExportKind) -> Result<(), CliError> {
        let output = Output::new();
        let config = global.load_config()?;

        let dictionaries = Dictionaries::from_config(&config.lookup_resolved);
        let storage = FsBlobStorage::new(config.storage_resolved.root.clone());
        let pdf = PdfClient::from_config(&config.pdf);
        let transformer = Transformer::new(&config, &dictionaries, &storage, &pdf);

        let payload = std::fs::read_to_string(&self.input)?;
        output.info(&format!("Exporting {}...", self.input.display()));
        let envelope = match kind {
            ExportKind::Plan => {
                let plan: Plan = serde_json::from_str(&payload)?;
                transformer.export_plan(&plan, &self.variant)?
            }
            ExportKind::Description => {
                let description: Description = serde_json::from_str(&payload)?;
                transformer.export_description(&description, &self.variant)?
            }
        };

        if let Some(reference) = envelope.storage_ref() {
            output.success(&format!(
                "Stored {} as {reference}",
                envelope.display_name().unwrap_or_default()
            ));
            output.info(&format!(
                "Storage root: {}",
                config.storage_resolved.root.display()
            ));
            return Ok(());
        }

        let Some(bytes) = &envelope.file else {
            output.warning("Export produced no file");
            return Ok(());
        };
        let target = output_path(self.output.as_deref(), &envelope);
        std::fs::write(&target, bytes)?;
        output.success(&format!(
            "Wrote {} ({} bytes)",
            target.display(),
            bytes.len()
        ));
        Ok(())
    }
}

/// The explicit output path, or the export filename.
fn output_path(explicit: Option<&Path>, envelope: &FileEnvelope) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(envelope.display_name().unwrap_or("export")),
    }
}
