use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Visibility of one node, as stored with a description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisibilityState {
    pub field_id: String,
    pub ordinal: Option<i32>,
    pub visible: bool,
}

/// Lookup of `(node id, ordinal)` visibility.
///
/// The ordinal is present only for nodes inside a multiplicity item.
/// Missing entries are not visible.
#[derive(Debug, Clone, Default)]
pub struct VisibilityMap {
    entries: HashMap<(String, Option<i32>), bool>,
}

impl VisibilityMap {
    pub fn from_states(states: &[VisibilityState]) -> Self {
        let entries = states
            .iter()
            .map(|state| ((state.field_id.clone(), state.ordinal), state.visible))
            .collect();
        Self { entries }
    }

    /// Builder-style insert, mostly for tests.
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, ordinal: Option<i32>, visible: bool) -> Self {
        self.entries.insert((id.into(), ordinal), visible);
        self
    }

    pub fn is_visible(&self, id: &str, ordinal: Option<i32>) -> bool {
        self.entries
            .get(&(id.to_owned(), ordinal))
            .copied()
            .unwrap_or(false)
    }
}
