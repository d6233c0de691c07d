//! Data model consumed by the docxport export engine.
//!
//! All types deserialize from the camelCase JSON payloads sent by the host:
//!
//! - [`Plan`] with its [`PlanBlueprint`] and child [`Description`]s
//! - [`DescriptionTemplate`]: the Page → Section → FieldSet → Field tree
//! - [`Properties`]: the value tree keyed by field-set and field id
//! - [`VisibilityMap`]: the `(id, ordinal)` visibility oracle
//! - [`FileEnvelope`]: inline bytes or a blob storage reference

mod blueprint;
mod description;
mod file;
mod plan;
mod plugin;
mod reference;
mod template;
mod value;
mod visibility;

pub use blueprint::{
    BlueprintDefinition, BlueprintField, BlueprintSection, ExtraField, ExtraFieldDataType,
    PlanBlueprint, ReferenceTypeField, SystemField, SystemFieldType, UploadField,
};
pub use description::{Description, DescriptionInternalStatus, DescriptionStatus};
pub use file::FileEnvelope;
pub use plan::{
    AccessType, EntityDoi, Plan, PlanBlueprintValue, PlanContact, PlanInternalStatus,
    PlanProperties, PlanReference, PlanReferenceData, PlanStatus, PlanUser, User,
};
pub use plugin::{Plugin, PluginField, PluginType};
pub use reference::{Reference, ReferenceDefinition, ReferenceField, ReferenceType};
pub use template::{
    DescriptionTemplate, DescriptionTemplateDefinition, DescriptionTemplateType, Field, FieldData,
    FieldSet, LabelData, Multiplicity, Page, RadioBoxData, ReferenceTypeData, Section,
    SelectData, SelectOption, UploadData, UploadOption,
};
pub use value::{ExternalIdentifier, FieldSetItem, FieldSetValue, FieldValue, Properties};
pub use visibility::{VisibilityMap, VisibilityState};
