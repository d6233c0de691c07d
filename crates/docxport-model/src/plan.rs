use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Description, FileEnvelope, PlanBlueprint, Reference};

/// A versioned data management plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Plan {
    pub id: Option<Uuid>,
    pub label: Option<String>,
    pub version: Option<i32>,
    pub description: Option<String>,
    pub status: Option<PlanStatus>,
    /// Language code, e.g. "en".
    pub language: Option<String>,
    pub access_type: Option<AccessType>,
    pub plan_blueprint: Option<PlanBlueprint>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub public_after: Option<DateTime<Utc>>,
    pub entity_dois: Vec<EntityDoi>,
    pub creator: Option<User>,
    pub users: Vec<PlanUser>,
    pub properties: Option<PlanProperties>,
    pub references: Vec<PlanReference>,
    pub descriptions: Vec<Description>,
}

impl Plan {
    pub fn internal_status(&self) -> Option<PlanInternalStatus> {
        self.status.as_ref().and_then(|s| s.internal_status)
    }

    pub fn is_finalized(&self) -> bool {
        self.internal_status() == Some(PlanInternalStatus::Finalized)
    }

    /// Whether the plan's public-after instant lies in the future of `now`.
    pub fn is_public_at(&self, now: DateTime<Utc>) -> bool {
        self.public_after.is_some_and(|after| after > now)
    }

    /// References of the given type code. When `blueprint_field_id` is set,
    /// only references bound to that blueprint field are returned.
    pub fn references_of_type(
        &self,
        code: &str,
        blueprint_field_id: Option<Uuid>,
    ) -> Vec<&Reference> {
        self.references
            .iter()
            .filter(|plan_ref| {
                plan_ref.reference.as_ref().and_then(Reference::type_code) == Some(code)
            })
            .filter(|plan_ref| match blueprint_field_id {
                None => true,
                Some(id) => plan_ref
                    .data
                    .as_ref()
                    .is_some_and(|data| data.blueprint_field_id == Some(id)),
            })
            .filter_map(|plan_ref| plan_ref.reference.as_ref())
            .collect()
    }

    /// Blueprint value stored for a blueprint field.
    pub fn blueprint_value(&self, field_id: Uuid) -> Option<&PlanBlueprintValue> {
        self.properties
            .as_ref()?
            .plan_blueprint_values
            .iter()
            .find(|value| value.field_id == Some(field_id))
    }

    pub fn contacts(&self) -> &[PlanContact] {
        self.properties
            .as_ref()
            .map_or(&[], |p| p.contacts.as_slice())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanStatus {
    pub name: Option<String>,
    pub internal_status: Option<PlanInternalStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanInternalStatus {
    Draft,
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessType {
    Public,
    Restricted,
}

impl AccessType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Restricted => "Restricted",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityDoi {
    pub doi: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanUser {
    pub user: Option<User>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanProperties {
    pub contacts: Vec<PlanContact>,
    pub plan_blueprint_values: Vec<PlanBlueprintValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// Value of one blueprint extra or upload field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanBlueprintValue {
    pub field_id: Option<Uuid>,
    pub value: Option<String>,
    pub date_value: Option<DateTime<Utc>>,
    pub number_value: Option<f64>,
    pub file: Option<FileEnvelope>,
}

impl PlanBlueprintValue {
    /// Text value when present and not blank.
    pub fn text(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanReference {
    pub reference: Option<Reference>,
    pub data: Option<PlanReferenceData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanReferenceData {
    pub blueprint_field_id: Option<Uuid>,
}
