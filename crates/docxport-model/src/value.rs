//! Value tree parallel to the description template.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FileEnvelope, Reference};

/// Values of a description, keyed by field-set id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Properties {
    pub field_sets: HashMap<String, FieldSetValue>,
}

impl Properties {
    /// Items of a field-set sorted by ordinal.
    pub fn sorted_items(&self, field_set_id: &str) -> Vec<&FieldSetItem> {
        let mut items: Vec<&FieldSetItem> = self
            .field_sets
            .get(field_set_id)
            .map(|value| value.items.iter().collect())
            .unwrap_or_default();
        items.sort_by_key(|item| item.ordinal);
        items
    }

    /// Every reference stored anywhere in the tree.
    pub fn all_references(&self) -> impl Iterator<Item = &Reference> {
        self.field_sets
            .values()
            .flat_map(|fs| &fs.items)
            .flat_map(|item| item.fields.values())
            .flat_map(|value| value.references.iter().flatten())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldSetValue {
    pub items: Vec<FieldSetItem>,
    pub comment: Option<String>,
}

impl FieldSetValue {
    /// Comment when present and not empty.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.is_empty())
    }
}

/// One multiplicity instance of a field-set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldSetItem {
    pub ordinal: i32,
    pub fields: HashMap<String, FieldValue>,
}

/// Value of one field. Which member is meaningful depends on the field data kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldValue {
    pub text_value: Option<String>,
    pub text_list_value: Option<Vec<String>>,
    pub date_value: Option<DateTime<Utc>>,
    pub boolean_value: Option<bool>,
    pub references: Option<Vec<Reference>>,
    pub external_identifier: Option<ExternalIdentifier>,
    pub file: Option<FileEnvelope>,
}

impl FieldValue {
    /// Text value when present and not blank.
    pub fn text(&self) -> Option<&str> {
        self.text_value.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Upload values carry the file id in `text_value`; an empty one means no upload.
    pub fn has_upload(&self) -> bool {
        self.text_value.as_deref().is_some_and(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalIdentifier {
    pub identifier: Option<String>,
    #[serde(rename = "type")]
    pub identifier_type: Option<String>,
}
