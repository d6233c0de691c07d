//! Configuration management for docxport.
//!
//! Parses `docxport.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `transformer.id`
//! - `templates.plan`
//! - `templates.description`
//! - `pdf.url`
//! - `storage.root`

mod expand;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override PDF conversion service URL.
    pub pdf_url: Option<String>,
    /// Override shared storage flag.
    pub use_shared_storage: Option<bool>,
    /// Override blob storage root directory.
    pub storage_root: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docxport.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transformer identity and storage mode.
    pub transformer: TransformerConfig,
    /// Template paths (relative strings from TOML).
    templates: TemplatesConfigRaw,
    /// Reference type codes with special rendering.
    pub references: ReferenceCodes,
    /// PDF conversion service.
    pub pdf: PdfConfig,
    /// Blob storage (relative strings from TOML).
    storage: StorageConfigRaw,
    /// Dictionary overrides (relative strings from TOML).
    lookup: LookupConfigRaw,
    /// Plugin configuration fields that may carry custom templates.
    pub configuration_fields: Vec<ConfigurationField>,

    /// Resolved template paths (set after loading).
    #[serde(skip)]
    pub templates_resolved: TemplatesConfig,
    /// Resolved storage configuration (set after loading).
    #[serde(skip)]
    pub storage_resolved: StorageConfig,
    /// Resolved dictionary overrides (set after loading).
    #[serde(skip)]
    pub lookup_resolved: LookupConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Transformer identity.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Identifier matched against plugin codes when looking up custom templates.
    pub id: String,
    /// Store exported files in blob storage and return a reference.
    pub use_shared_storage: bool,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            id: "docx".to_owned(),
            use_shared_storage: false,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TemplatesConfigRaw {
    plan: Option<String>,
    description: Option<String>,
}

/// Resolved template paths.
#[derive(Debug, Default, Clone)]
pub struct TemplatesConfig {
    /// Default plan template.
    pub plan: PathBuf,
    /// Default description template.
    pub description: PathBuf,
}

/// Reference type codes that get role-specific rendering.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReferenceCodes {
    pub organization: String,
    pub grant: String,
    pub researcher: String,
    pub licence: String,
    pub dataset: String,
    pub publication: String,
}

impl Default for ReferenceCodes {
    fn default() -> Self {
        Self {
            organization: "organizations".to_owned(),
            grant: "grants".to_owned(),
            researcher: "researchers".to_owned(),
            licence: "licenses".to_owned(),
            dataset: "datasets".to_owned(),
            publication: "publications".to_owned(),
        }
    }
}

/// PDF conversion service configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PdfConfig {
    /// Base URL of the conversion service.
    pub url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Largest converted document accepted from the service.
    pub max_response_bytes: u64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_owned(),
            timeout_secs: 120,
            max_response_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct StorageConfigRaw {
    root: Option<String>,
}

/// Resolved blob storage configuration.
#[derive(Debug, Default, Clone)]
pub struct StorageConfig {
    /// Directory holding stored blobs.
    pub root: PathBuf,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LookupConfigRaw {
    languages: Option<String>,
    pid_links: Option<String>,
}

/// Resolved dictionary overrides.
///
/// `None` means the built-in table is used.
#[derive(Debug, Default, Clone)]
pub struct LookupConfig {
    pub languages: Option<PathBuf>,
    pub pid_links: Option<PathBuf>,
}

/// Entity kinds a configuration field applies to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppliesTo {
    Plan,
    Description,
}

/// Plugin configuration field advertised by this transformer.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ConfigurationField {
    /// Field code matched against plugin field codes.
    pub code: String,
    /// Human readable label.
    #[serde(default)]
    pub label: String,
    /// Entity kinds the field applies to.
    #[serde(default)]
    pub applies_to: Vec<AppliesTo>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`pdf.url`").
        field: String,
        /// Error message (e.g., "${`PDF_URL`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docxport.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(url) = &settings.pdf_url {
            self.pdf.url.clone_from(url);
        }
        if let Some(shared) = settings.use_shared_storage {
            self.transformer.use_shared_storage = shared;
        }
        if let Some(root) = &settings.storage_root {
            self.storage_resolved.root.clone_from(root);
        }
    }

    /// Configuration fields that apply to the given entity kind.
    pub fn configuration_fields_for(&self, kind: AppliesTo) -> impl Iterator<Item = &ConfigurationField> {
        self.configuration_fields
            .iter()
            .filter(move |field| field.applies_to.contains(&kind))
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            transformer: TransformerConfig::default(),
            templates: TemplatesConfigRaw::default(),
            references: ReferenceCodes::default(),
            pdf: PdfConfig::default(),
            storage: StorageConfigRaw::default(),
            lookup: LookupConfigRaw::default(),
            configuration_fields: Vec::new(),
            templates_resolved: TemplatesConfig {
                plan: base.join("templates/plan.docx"),
                description: base.join("templates/description.docx"),
            },
            storage_resolved: StorageConfig {
                root: base.join(".docxport/storage"),
            },
            lookup_resolved: LookupConfig::default(),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.transformer.id, "transformer.id")?;
        self.validate_references()?;
        self.validate_pdf()?;
        for field in &self.configuration_fields {
            require_non_empty(&field.code, "configuration_fields.code")?;
        }
        Ok(())
    }

    fn validate_references(&self) -> Result<(), ConfigError> {
        let codes = &self.references;
        require_non_empty(&codes.organization, "references.organization")?;
        require_non_empty(&codes.grant, "references.grant")?;
        require_non_empty(&codes.researcher, "references.researcher")?;
        require_non_empty(&codes.licence, "references.licence")?;
        require_non_empty(&codes.dataset, "references.dataset")?;
        require_non_empty(&codes.publication, "references.publication")?;
        Ok(())
    }

    fn validate_pdf(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.pdf.url, "pdf.url")?;
        require_http_url(&self.pdf.url, "pdf.url")?;
        if self.pdf.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "pdf.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.transformer.id = expand::expand_env(&self.transformer.id, "transformer.id")?;
        self.pdf.url = expand::expand_env(&self.pdf.url, "pdf.url")?;

        if let Some(ref plan) = self.templates.plan {
            self.templates.plan = Some(expand::expand_env(plan, "templates.plan")?);
        }
        if let Some(ref description) = self.templates.description {
            self.templates.description =
                Some(expand::expand_env(description, "templates.description")?);
        }
        if let Some(ref root) = self.storage.root {
            self.storage.root = Some(expand::expand_env(root, "storage.root")?);
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.templates_resolved = TemplatesConfig {
            plan: resolve(self.templates.plan.as_deref(), "templates/plan.docx"),
            description: resolve(
                self.templates.description.as_deref(),
                "templates/description.docx",
            ),
        };
        self.storage_resolved = StorageConfig {
            root: resolve(self.storage.root.as_deref(), ".docxport/storage"),
        };
        self.lookup_resolved = LookupConfig {
            languages: self.lookup.languages.as_deref().map(|p| config_dir.join(p)),
            pid_links: self.lookup.pid_links.as_deref().map(|p| config_dir.join(p)),
        };
    }
}
