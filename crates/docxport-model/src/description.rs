use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DescriptionTemplate, Plan, Properties, VisibilityMap, VisibilityState};

/// A description: one filled-in description template attached to a plan section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Description {
    pub id: Option<Uuid>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub status: Option<DescriptionStatus>,
    pub created_at: Option<DateTime<Utc>>,
    /// Blueprint section the description belongs to.
    pub section_id: Option<Uuid>,
    pub description_template: Option<DescriptionTemplate>,
    pub properties: Option<Properties>,
    pub visibility_states: Vec<VisibilityState>,
    /// Owning plan, present when the description is exported on its own.
    pub plan: Option<Box<Plan>>,
}

impl Description {
    pub fn internal_status(&self) -> Option<DescriptionInternalStatus> {
        self.status.as_ref().and_then(|s| s.internal_status)
    }

    pub fn visibility(&self) -> VisibilityMap {
        VisibilityMap::from_states(&self.visibility_states)
    }

    /// Name of the description template type, e.g. "Dataset".
    pub fn template_type_name(&self) -> Option<&str> {
        self.description_template
            .as_ref()?
            .template_type
            .as_ref()
            .map(|t| t.name.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescriptionStatus {
    pub name: Option<String>,
    pub internal_status: Option<DescriptionInternalStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptionInternalStatus {
    Draft,
    Finalized,
    Canceled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_description() {
        let json = r#"{
            "label": "Survey data",
            "status": {"name": "Finalized", "internalStatus": "Finalized"},
            "sectionId": "6f1c9a2e-0000-4000-8000-000000000001",
            "descriptionTemplate": {"label": "Dataset template", "type": {"name": "Dataset"}},
            "visibilityStates": [{"fieldId": "page-1", "visible": true}]
        }"#;
        let description: Description = serde_json::from_str(json).unwrap();

        assert_eq!(
            description.internal_status(),
            Some(DescriptionInternalStatus::Finalized)
        );
        assert_eq!(description.template_type_name(), Some("Dataset"));
        assert!(description.visibility().is_visible("page-1", None));
        assert!(description.plan.is_none());
    }
}
