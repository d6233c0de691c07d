//! CLI command implementations.

pub(crate) mod config;
pub(crate) mod export;

pub(crate) use config::ConfigArgs;
pub(crate) use export::{ExportArgs, ExportKind};
