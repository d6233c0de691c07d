use std::path::Path;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::{LookupError, read_file};

static BUILTIN: LazyLock<PidLinks> = LazyLock::new(|| {
    PidLinks::from_json(include_str!("../data/pid_links.json"))
        .expect("invalid embedded pid_links.json")
});

const PID_PLACEHOLDER: &str = "{pid}";

#[derive(Debug, Clone, Deserialize)]
struct PidLink {
    pid: String,
    link: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PidLinksFile {
    #[serde(default)]
    pid_links: Vec<PidLink>,
}

/// Persistent identifier type to resolver URL template table.
#[derive(Debug, Clone, Default)]
pub struct PidLinks {
    links: Vec<PidLink>,
}

impl PidLinks {
    /// The table compiled into the binary.
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Parse a `{"pidLinks": [{"pid": .., "link": ..}]}` document.
    pub fn from_json(json: &str) -> Result<Self, LookupError> {
        let file: PidLinksFile = serde_json::from_str(json)?;
        Ok(Self {
            links: file.pid_links,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LookupError> {
        let links = Self::from_json(&read_file(path)?)?;
        tracing::debug!(path = %path.display(), count = links.links.len(), "Loaded PID links");
        Ok(links)
    }

    /// URL template registered for a PID type, first match wins.
    pub fn template_for(&self, pid_type: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.pid == pid_type)
            .map(|link| link.link.as_str())
    }

    /// Resolver URL for a value of the given PID type.
    pub fn link_for(&self, pid_type: &str, value: &str) -> Option<String> {
        self.template_for(pid_type)
            .map(|template| template.replace(PID_PLACEHOLDER, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_link_for_known_type() {
        let links = PidLinks::builtin();
        assert_eq!(
            links.link_for("orcid", "0000-0002-1825-0097").as_deref(),
            Some("https://orcid.org/0000-0002-1825-0097")
        );
        assert_eq!(links.link_for("unknown", "x"), None);
    }

    #[test]
    fn test_custom_table() {
        let links = PidLinks::from_json(
            r#"{"pidLinks": [{"pid": "ex", "link": "https://ex.org/{pid}/{pid}"}]}"#,
        )
        .unwrap();
        assert_eq!(links.template_for("ex"), Some("https://ex.org/{pid}/{pid}"));
        assert_eq!(links.link_for("ex", "1").as_deref(), Some("https://ex.org/1/1"));
    }

    #[test]
    fn test_missing_list_is_empty() {
        let links = PidLinks::from_json("{}").unwrap();
        assert_eq!(links.template_for("doi"), None);
    }
}
