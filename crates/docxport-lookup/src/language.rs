use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::{LookupError, read_file};

static BUILTIN: LazyLock<Languages> = LazyLock::new(|| {
    Languages::from_json(include_str!("../data/languages.json"))
        .expect("invalid embedded languages.json")
});

#[derive(Debug, Deserialize)]
struct Entry {
    code: String,
    name: String,
}

/// Language code to display name table.
#[derive(Debug, Clone, Default)]
pub struct Languages {
    names: HashMap<String, String>,
}

impl Languages {
    /// The table compiled into the binary.
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Parse a `[{"code": .., "name": ..}]` array. Later duplicates are ignored.
    pub fn from_json(json: &str) -> Result<Self, LookupError> {
        let entries: Vec<Entry> = serde_json::from_str(json)?;
        let mut names = HashMap::with_capacity(entries.len());
        for entry in entries {
            names.entry(entry.code).or_insert(entry.name);
        }
        Ok(Self { names })
    }

    pub fn load(path: &Path) -> Result<Self, LookupError> {
        let languages = Self::from_json(&read_file(path)?)?;
        tracing::debug!(path = %path.display(), count = languages.len(), "Loaded languages");
        Ok(languages)
    }

    /// Display name for a language code.
    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let languages = Languages::builtin();
        assert!(!languages.is_empty());
        assert_eq!(languages.name_of("en"), Some("English"));
        assert_eq!(languages.name_of("xx"), None);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let languages =
            Languages::from_json(r#"[{"code":"en","name":"English"},{"code":"en","name":"Other"}]"#)
                .unwrap();
        assert_eq!(languages.len(), 1);
        assert_eq!(languages.name_of("en"), Some("English"));
    }

    #[test]
    fn test_rejects_wrong_shape() {
        assert!(Languages::from_json(r#"{"en": "English"}"#).is_err());
    }
}
