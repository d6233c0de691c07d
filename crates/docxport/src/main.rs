//! docxport CLI - plan and description export.
//!
//! Provides commands for:
//! - `export-plan`: Render a plan to `.docx` or PDF
//! - `export-description`: Render a single description
//! - `config`: Show the resolved configuration

mod commands;
mod error;
mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docxport_config::{CliSettings, Config};
use tracing_subscriber::EnvFilter;

use commands::{ConfigArgs, ExportArgs, ExportKind};
use error::CliError;
use output::Output;

/// docxport - export data management plans to Word and PDF.
#[derive(Parser)]
#[command(name = "docxport", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover docxport.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output (info level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// PDF conversion service URL (overrides config).
    #[arg(long, global = true, env = "DOCXPORT_PDF_URL")]
    pdf_url: Option<String>,

    /// Store exported files in blob storage instead of writing them out.
    #[arg(long, global = true)]
    shared_storage: bool,

    /// Blob storage root directory (overrides config).
    #[arg(long, global = true)]
    storage_root: Option<PathBuf>,
}

impl GlobalArgs {
    /// Load configuration with command line overrides applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            pdf_url: self.pdf_url.clone(),
            use_shared_storage: self.shared_storage.then_some(true),
            storage_root: self.storage_root.clone(),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export a plan from its JSON payload.
    ExportPlan(ExportArgs),
    /// Export a description from its JSON payload.
    ExportDescription(ExportArgs),
    /// Show the resolved configuration.
    Config(ConfigArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, RUST_LOG overrides, otherwise WARN
    let default_level = if cli.global.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::ExportPlan(args) => args.execute(&cli.global, ExportKind::Plan),
        Commands::ExportDescription(args) => args.execute(&cli.global, ExportKind::Description),
        Commands::Config(args) => args.execute(&cli.global),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
