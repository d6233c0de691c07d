//! `docxport config` command implementation.

use clap::Args;
use docxport_config::{AppliesTo, Config};
use docxport_transformer::Capabilities;

use crate::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the config command.
#[derive(Args)]
pub(crate) struct ConfigArgs {
    /// Print the transformer capabilities as JSON instead.
    #[arg(long)]
    json: bool,
}

impl ConfigArgs {
    /// Execute the config command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails to load or validate.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let config = global.load_config()?;
        let output = Output::new();
        if self.json {
            output.payload(&capabilities_json(&config)?)?;
            return Ok(());
        }

        match &config.config_path {
            Some(path) => output.info(&format!("Configuration: {}", path.display())),
            None => output.warning("No docxport.toml found, using defaults"),
        }

        output.section("Transformer");
        output.entry("id", &config.transformer.id);
        output.entry(
            "shared storage",
            &config.transformer.use_shared_storage.to_string(),
        );

        output.section("Templates");
        output.entry("plan", &config.templates_resolved.plan.display().to_string());
        output.entry(
            "description",
            &config.templates_resolved.description.display().to_string(),
        );

        output.section("References");
        let codes = &config.references;
        output.entry("organization", &codes.organization);
        output.entry("grant", &codes.grant);
        output.entry("researcher", &codes.researcher);
        output.entry("licence", &codes.licence);
        output.entry("dataset", &codes.dataset);
        output.entry("publication", &codes.publication);

        output.section("Services");
        output.entry("pdf url", &config.pdf.url);
        output.entry("pdf timeout", &format!("{}s", config.pdf.timeout_secs));
        output.entry(
            "storage root",
            &config.storage_resolved.root.display().to_string(),
        );

        output.section("Configuration fields");
        for kind in [AppliesTo::Plan, AppliesTo::Description] {
            let codes: Vec<&str> = config
                .configuration_fields_for(kind)
                .map(|field| field.code.as_str())
                .collect();
            output.entry(&format!("{kind:?}"), &codes.join(", "));
        }
        Ok(())
    }
}

/// Capabilities as reported to the host application.
fn capabilities_json(config: &Config) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(&Capabilities::from_config(config))?)
}
