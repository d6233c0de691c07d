//! Language and persistent identifier dictionaries.
//!
//! Both tables ship embedded in the binary and are parsed on first use.
//! Deployments can point `[lookup]` in `docxport.toml` at replacement files;
//! a replacement that fails to load is logged and the built-in table is used.
//!
//! # Example
//!
//! ```
//! use docxport_lookup::Dictionaries;
//!
//! let dictionaries = Dictionaries::builtin();
//! assert_eq!(dictionaries.languages().name_of("el"), Some("Greek"));
//! assert_eq!(
//!     dictionaries.pid_links().link_for("doi", "10.1234/abc").as_deref(),
//!     Some("https://doi.org/10.1234/abc")
//! );
//! ```

mod language;
mod pid;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use docxport_config::LookupConfig;

pub use language::Languages;
pub use pid::PidLinks;

/// Dictionary loading error.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// Reading an override file failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Dictionary JSON is malformed.
    #[error("Invalid dictionary JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn read_file(path: &Path) -> Result<String, LookupError> {
    std::fs::read_to_string(path).map_err(|source| LookupError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Language and PID tables resolved against configuration.
///
/// Override files are read at most once per instance.
#[derive(Debug, Default)]
pub struct Dictionaries {
    languages_path: Option<PathBuf>,
    pid_links_path: Option<PathBuf>,
    languages: OnceLock<Languages>,
    pid_links: OnceLock<PidLinks>,
}

impl Dictionaries {
    /// Dictionaries backed only by the embedded tables.
    #[must_use]
    pub fn builtin() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: &LookupConfig) -> Self {
        Self {
            languages_path: config.languages.clone(),
            pid_links_path: config.pid_links.clone(),
            ..Self::default()
        }
    }

    pub fn languages(&self) -> &Languages {
        let Some(path) = &self.languages_path else {
            return Languages::builtin();
        };
        self.languages
            .get_or_init(|| match Languages::load(path) {
                Ok(languages) => languages,
                Err(e) => {
                    tracing::warn!(error = %e, "Falling back to built-in languages");
                    Languages::builtin().clone()
                }
            })
    }

    pub fn pid_links(&self) -> &PidLinks {
        let Some(path) = &self.pid_links_path else {
            return PidLinks::builtin();
        };
        self.pid_links
            .get_or_init(|| match PidLinks::load(path) {
                Ok(links) => links,
                Err(e) => {
                    tracing::warn!(error = %e, "Falling back to built-in PID links");
                    PidLinks::builtin().clone()
                }
            })
    }
}
