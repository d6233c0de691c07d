use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An external reference (grant, researcher, organization, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reference {
    pub id: Option<Uuid>,
    pub label: Option<String>,
    pub description: Option<String>,
    /// Identifier value, e.g. a DOI or ROR id.
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub reference_type: Option<ReferenceType>,
    pub definition: Option<ReferenceDefinition>,
}

impl Reference {
    /// Label, falling back to the description when the label is blank.
    pub fn display_label(&self) -> Option<&str> {
        non_blank(self.label.as_deref()).or_else(|| non_blank(self.description.as_deref()))
    }

    pub fn type_code(&self) -> Option<&str> {
        self.reference_type.as_ref().map(|t| t.code.as_str())
    }

    /// Value of the definition field with the given code.
    pub fn definition_value(&self, code: &str) -> Option<&str> {
        self.definition
            .as_ref()?
            .fields
            .iter()
            .find(|field| field.code == code)
            .and_then(|field| field.value.as_deref())
    }
}

/// Kind of a reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceType {
    pub id: Option<Uuid>,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceDefinition {
    pub fields: Vec<ReferenceField>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceField {
    pub code: String,
    pub value: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label_prefers_label() {
        let reference = Reference {
            label: Some("EU-H2020".to_owned()),
            description: Some("Horizon".to_owned()),
            ..Reference::default()
        };
        assert_eq!(reference.display_label(), Some("EU-H2020"));
    }

    #[test]
    fn test_display_label_falls_back_to_description() {
        let reference = Reference {
            label: Some(" ".to_owned()),
            description: Some("Horizon".to_owned()),
            ..Reference::default()
        };
        assert_eq!(reference.display_label(), Some("Horizon"));
    }

    #[test]
    fn test_definition_value() {
        let json = r#"{
            "reference": "10.1234/abc",
            "type": {"name": "Datasets", "code": "datasets"},
            "definition": {"fields": [{"code": "pidTypeField", "value": "doi"}]}
        }"#;
        let reference: Reference = serde_json::from_str(json).unwrap();
        assert_eq!(reference.type_code(), Some("datasets"));
        assert_eq!(reference.definition_value("pidTypeField"), Some("doi"));
        assert_eq!(reference.definition_value("missing"), None);
    }
}
