//! Output filenames.

use std::sync::LazyLock;

use docxport_model::{Description, Plan};
use regex::Regex;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9+ ]").expect("invalid filename regex"));

/// `{label}{ext}`, or `PLAN_{grant}_{version}{ext}` for unlabelled plans.
///
/// The grant is the first reference of type `grant_code`. When neither a
/// label nor a grant exists the name is the extension alone.
pub fn plan_filename(plan: &Plan, grant_code: &str, extension: &str) -> String {
    if let Some(label) = &plan.label {
        return format!("{label}{extension}");
    }
    let grant = plan
        .references_of_type(grant_code, None)
        .into_iter()
        .find_map(|reference| reference.label.as_deref());
    match (grant, plan.version) {
        (Some(grant), Some(version)) => format!("PLAN_{grant}_{version}{extension}"),
        (Some(grant), None) => format!("PLAN_{grant}{extension}"),
        (None, _) => extension.to_owned(),
    }
}

/// The description label stripped to `[a-zA-Z0-9+ ]`, plus the extension.
pub fn description_filename(description: &Description, extension: &str) -> String {
    let label = description.label.as_deref().unwrap_or_default();
    format!("{}{extension}", UNSAFE_CHARS.replace_all(label, ""))
}
