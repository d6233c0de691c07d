//! Plan blueprint: the section/field layout a plan is rendered with.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Plugin, ReferenceType, UploadOption};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanBlueprint {
    pub id: Option<Uuid>,
    pub label: Option<String>,
    pub definition: Option<BlueprintDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlueprintDefinition {
    pub sections: Option<Vec<BlueprintSection>>,
    pub plugins: Vec<Plugin>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlueprintSection {
    pub id: Option<Uuid>,
    pub label: Option<String>,
    pub ordinal: i32,
    pub fields: Vec<BlueprintField>,
}

/// A blueprint field, tagged by its category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "category")]
pub enum BlueprintField {
    System(SystemField),
    Extra(ExtraField),
    ReferenceType(ReferenceTypeField),
    Upload(UploadField),
}

impl BlueprintField {
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Self::System(f) => f.id,
            Self::Extra(f) => f.id,
            Self::ReferenceType(f) => f.id,
            Self::Upload(f) => f.id,
        }
    }

    pub fn ordinal(&self) -> i32 {
        match self {
            Self::System(f) => f.ordinal,
            Self::Extra(f) => f.ordinal,
            Self::ReferenceType(f) => f.ordinal,
            Self::Upload(f) => f.ordinal,
        }
    }

    /// Label when present and not blank.
    pub fn label(&self) -> Option<&str> {
        let label = match self {
            Self::System(f) => f.label.as_deref(),
            Self::Extra(f) => f.label.as_deref(),
            Self::ReferenceType(f) => f.label.as_deref(),
            Self::Upload(f) => f.label.as_deref(),
        };
        label.filter(|l| !l.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemField {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub ordinal: i32,
    pub system_field_type: SystemFieldType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemFieldType {
    Title,
    Description,
    Language,
    Contact,
    AccessRights,
    User,
}

impl SystemFieldType {
    /// Label used when the blueprint field carries none.
    pub fn default_label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Description => "Description",
            Self::Language => "Language",
            Self::Contact => "Contact",
            Self::AccessRights => "Access Rights",
            Self::User => "User",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraField {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub ordinal: i32,
    pub data_type: ExtraFieldDataType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtraFieldDataType {
    RichText,
    Number,
    Date,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTypeField {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub ordinal: i32,
    pub reference_type: ReferenceType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadField {
    pub id: Option<Uuid>,
    pub label: Option<String>,
    pub ordinal: i32,
    pub types: Vec<UploadOption>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_blueprint_fields() {
        let json = r#"{
            "label": "Horizon Europe",
            "definition": {"sections": [{
                "label": "Main", "ordinal": 1,
                "fields": [
                    {"category": "System", "ordinal": 2, "systemFieldType": "AccessRights"},
                    {"category": "Extra", "label": "Budget", "ordinal": 1, "dataType": "Number"},
                    {"category": "ReferenceType", "ordinal": 3,
                     "referenceType": {"name": "Grants", "code": "grants"}},
                    {"category": "Upload", "ordinal": 4,
                     "types": [{"label": "PNG", "value": "image/png"}]}
                ]
            }]}
        }"#;
        let blueprint: PlanBlueprint = serde_json::from_str(json).unwrap();
        let sections = blueprint.definition.unwrap().sections.unwrap();
        let fields = &sections[0].fields;

        assert!(matches!(
            fields[0],
            BlueprintField::System(SystemField {
                system_field_type: SystemFieldType::AccessRights,
                ..
            })
        ));
        assert_eq!(fields[0].label(), None);
        assert_eq!(fields[1].label(), Some("Budget"));
        assert_eq!(fields[1].ordinal(), 1);
        assert!(matches!(fields[2], BlueprintField::ReferenceType(_)));
        assert!(matches!(fields[3], BlueprintField::Upload(_)));
    }

    #[test]
    fn test_system_field_default_labels() {
        assert_eq!(SystemFieldType::AccessRights.default_label(), "Access Rights");
        assert_eq!(SystemFieldType::Title.default_label(), "Title");
    }
}
