//! Description template: the Page → Section → FieldSet → Field tree.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Plugin, ReferenceType};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescriptionTemplate {
    pub id: Option<Uuid>,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub template_type: Option<DescriptionTemplateType>,
    pub definition: Option<DescriptionTemplateDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescriptionTemplateType {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescriptionTemplateDefinition {
    pub pages: Vec<Page>,
    pub plugins: Vec<Plugin>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub id: String,
    pub ordinal: i32,
    pub title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Section {
    pub id: String,
    pub ordinal: i32,
    pub title: String,
    pub sections: Vec<Section>,
    pub field_sets: Vec<FieldSet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldSet {
    pub id: String,
    pub ordinal: i32,
    pub title: Option<String>,
    pub multiplicity: Option<Multiplicity>,
    pub fields: Vec<Field>,
}

impl FieldSet {
    /// Whether repeated items render as a table.
    pub fn is_table_view(&self) -> bool {
        self.multiplicity.as_ref().is_some_and(|m| m.table_view)
    }

    /// Title when present and not empty.
    pub fn heading_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Multiplicity {
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub table_view: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    #[serde(default)]
    pub ordinal: i32,
    #[serde(default)]
    pub include_in_export: bool,
    #[serde(default)]
    pub data: Option<FieldData>,
}

/// Typed payload of a template field, one variant per field data kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "fieldType")]
pub enum FieldData {
    #[serde(rename = "freetext")]
    FreeText(LabelData),
    #[serde(rename = "textarea")]
    TextArea(LabelData),
    #[serde(rename = "richTextarea")]
    RichTextArea(LabelData),
    #[serde(rename = "datePicker")]
    DatePicker(LabelData),
    #[serde(rename = "boolean_decision")]
    BooleanDecision(LabelData),
    #[serde(rename = "checkBox")]
    CheckBox(LabelData),
    #[serde(rename = "radiobox")]
    RadioBox(RadioBoxData),
    #[serde(rename = "select")]
    Select(SelectData),
    #[serde(rename = "tags")]
    Tags(LabelData),
    #[serde(rename = "referenceTypes")]
    ReferenceTypes(ReferenceTypeData),
    #[serde(rename = "datasetIdentifier")]
    DatasetIdentifier(LabelData),
    #[serde(rename = "validation")]
    Validation(LabelData),
    #[serde(rename = "upload")]
    Upload(UploadData),
    #[serde(rename = "internalEntitiesPlans")]
    InternalEntriesPlans(LabelData),
    #[serde(rename = "internalEntitiesDescriptions")]
    InternalEntriesDescriptions(LabelData),
}

impl FieldData {
    pub fn label(&self) -> &str {
        match self {
            Self::FreeText(d)
            | Self::TextArea(d)
            | Self::RichTextArea(d)
            | Self::DatePicker(d)
            | Self::BooleanDecision(d)
            | Self::CheckBox(d)
            | Self::Tags(d)
            | Self::DatasetIdentifier(d)
            | Self::Validation(d)
            | Self::InternalEntriesPlans(d)
            | Self::InternalEntriesDescriptions(d) => &d.label,
            Self::RadioBox(d) => &d.label,
            Self::Select(d) => &d.label,
            Self::ReferenceTypes(d) => &d.label,
            Self::Upload(d) => &d.label,
        }
    }

    /// Whether the field accepts several values.
    pub fn multiple_select(&self) -> bool {
        match self {
            Self::Select(d) => d.multiple_select,
            Self::ReferenceTypes(d) => d.multiple_select,
            Self::InternalEntriesPlans(d) | Self::InternalEntriesDescriptions(d) => {
                d.multiple_select
            }
            _ => false,
        }
    }

    /// Header label for table view: the label, or the reference type name.
    pub fn header_label(&self) -> &str {
        match self {
            Self::ReferenceTypes(d) if d.label.is_empty() => &d.reference_type.name,
            _ => self.label(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelData {
    pub label: String,
    pub multiple_select: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectData {
    pub label: String,
    pub multiple_select: bool,
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RadioBoxData {
    pub label: String,
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTypeData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub multiple_select: bool,
    pub reference_type: ReferenceType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadData {
    pub label: String,
    pub types: Vec<UploadOption>,
    pub max_file_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadOption {
    pub label: String,
    /// MIME type accepted by the upload field.
    pub value: String,
}
