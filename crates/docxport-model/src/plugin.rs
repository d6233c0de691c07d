use serde::{Deserialize, Serialize};

use crate::FileEnvelope;

/// Plugin configuration attached to a blueprint or description template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Plugin {
    pub code: String,
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
    pub fields: Vec<PluginField>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginType {
    FileTransformer,
    DepositTransformer,
    Evaluator,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginField {
    pub code: String,
    pub file: Option<FileEnvelope>,
}
