use crate::cli::CheckArgs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default cap on diagnostics emitted per validation pass
pub const DEFAULT_MAX_PROBLEMS: usize = 100;
/// Default schema search location, relative to the workspace root
pub const DEFAULT_SCHEMA_LOCATION: &str = ".vscode/xmlschemas";

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Process-wide validation settings
///
/// Replaced wholesale whenever the editor sends new settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Cap on diagnostics emitted per validation pass; 0 means the default
    pub max_number_of_problems: usize,
    /// Directories (or `file://` URIs) searched for schemas
    pub schema_locations: Vec<String>,
    /// Schema files to skip (glob syntax)
    pub exclude_patterns: Vec<String>,
    /// Publish problems found in the schemas themselves
    pub publish_schema_diagnostics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_number_of_problems: DEFAULT_MAX_PROBLEMS,
            schema_locations: vec![DEFAULT_SCHEMA_LOCATION.to_string()],
            exclude_patterns: vec![],
            publish_schema_diagnostics: false,
        }
    }
}

/// One layer of settings; absent fields leave the layer below untouched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsLayer {
    #[serde(alias = "max_number_of_problems")]
    pub max_number_of_problems: Option<usize>,
    #[serde(alias = "schemalocations", alias = "schema_locations")]
    pub schema_locations: Option<Vec<String>>,
    #[serde(alias = "exclude_patterns")]
    pub exclude_patterns: Option<Vec<String>>,
    #[serde(alias = "publish_schema_diagnostics")]
    pub publish_schema_diagnostics: Option<bool>,
}

/// Settings file and editor payload shape: everything lives under `xml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SettingsDocument {
    #[serde(default)]
    pub xml: SettingsLayer,
}

impl Settings {
    /// Effective diagnostic cap: an unset (zero) maximum falls back to
    /// [`DEFAULT_MAX_PROBLEMS`]
    pub fn problem_limit(&self) -> usize {
        match self.max_number_of_problems {
            0 => DEFAULT_MAX_PROBLEMS,
            max => max,
        }
    }

    /// Apply a layer on top of these settings
    pub fn apply(mut self, layer: SettingsLayer) -> Self {
        if let Some(max) = layer.max_number_of_problems {
            self.max_number_of_problems = max;
        }
        if let Some(locations) = layer.schema_locations {
            self.schema_locations = locations;
        }
        if let Some(patterns) = layer.exclude_patterns {
            self.exclude_patterns = patterns;
        }
        if let Some(publish) = layer.publish_schema_diagnostics {
            self.publish_schema_diagnostics = publish;
        }
        self
    }

    /// Settings from an editor payload (`{ "xml": { ... } }`) applied on top
    /// of `base`. A payload without an `xml` section is read as the section
    /// itself; `null` yields `base`.
    pub fn from_lsp_value(base: &Settings, value: &serde_json::Value) -> Result<Settings> {
        let section = match value {
            serde_json::Value::Null => return Ok(base.clone()),
            serde_json::Value::Object(map) => map.get("xml").unwrap_or(value),
            _ => {
                return Err(ConfigError::Validation(format!(
                    "Expected a settings object, got: {}",
                    value
                )));
            }
        };

        let layer: SettingsLayer = serde_json::from_value(section.clone())?;
        let settings = base.clone().apply(layer);
        ConfigManager::validate_settings(&settings)?;
        Ok(settings)
    }
}

/// Configuration manager for loading and layering settings
pub struct ConfigManager;

impl ConfigManager {
    /// Load base settings with precedence: defaults -> file -> environment
    pub async fn load_settings(explicit_path: Option<&Path>) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(path) = explicit_path {
            let layer = Self::load_from_file(path).await?;
            settings = settings.apply(layer);
        } else if let Some(layer) = Self::find_config_file().await? {
            settings = settings.apply(layer);
        }

        let settings = Self::apply_environment_overrides(settings)?;

        Self::validate_settings(&settings)?;

        Ok(settings)
    }

    /// Load a settings layer from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<SettingsLayer> {
        let content = tokio::fs::read_to_string(path).await?;

        let document: SettingsDocument = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            Some(ext) => return Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(document) = toml::from_str::<SettingsDocument>(&content) {
                    document
                } else {
                    serde_json::from_str(&content)?
                }
            }
        };

        tracing::debug!("Loaded settings from {}", path.display());
        Ok(document.xml)
    }

    /// Find a settings file in the current directory or the user config directory
    pub async fn find_config_file() -> Result<Option<SettingsLayer>> {
        let mut candidates = Self::config_file_names()
            .iter()
            .map(PathBuf::from)
            .collect::<Vec<_>>();

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("validate-xml-lsp");
            candidates.extend(
                Self::config_file_names()
                    .iter()
                    .map(|name| app_config_dir.join(name)),
            );
        }

        for path in candidates {
            if path.is_file() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        Ok(None)
    }

    fn config_file_names() -> [&'static str; 4] {
        [
            "validate-xml-lsp.toml",
            "validate-xml-lsp.json",
            ".validate-xml-lsp.toml",
            ".validate-xml-lsp.json",
        ]
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(settings: Settings) -> Result<Settings> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, settings)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut settings: Settings,
    ) -> Result<Settings> {
        if let Some(max) = env.get("VALIDATE_XML_LSP_MAX_PROBLEMS") {
            settings.max_number_of_problems = max.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid VALIDATE_XML_LSP_MAX_PROBLEMS value: {}",
                    max
                ))
            })?;
        }

        if let Some(locations) = env.get("VALIDATE_XML_LSP_SCHEMA_LOCATIONS") {
            settings.schema_locations = split_list(&locations);
        }

        if let Some(patterns) = env.get("VALIDATE_XML_LSP_EXCLUDE_PATTERNS") {
            settings.exclude_patterns = split_list(&patterns);
        }

        if let Some(publish) = env.get("VALIDATE_XML_LSP_PUBLISH_SCHEMA_DIAGNOSTICS") {
            settings.publish_schema_diagnostics = publish.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid VALIDATE_XML_LSP_PUBLISH_SCHEMA_DIAGNOSTICS value: {}",
                    publish
                ))
            })?;
        }

        Ok(settings)
    }

    /// Merge `check` arguments with settings (arguments take precedence)
    pub fn merge_with_cli(mut settings: Settings, args: &CheckArgs) -> Settings {
        if !args.schema_locations.is_empty() {
            settings.schema_locations = args.schema_locations.clone();
        }
        if !args.exclude_patterns.is_empty() {
            settings.exclude_patterns = args.exclude_patterns.clone();
        }
        if let Some(max) = args.max_problems {
            settings.max_number_of_problems = max;
        }
        settings
    }

    /// Validate settings values
    pub fn validate_settings(settings: &Settings) -> Result<()> {
        if settings
            .schema_locations
            .iter()
            .any(|location| location.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "Schema locations cannot be empty".to_string(),
            ));
        }

        for pattern in &settings.exclude_patterns {
            globset::Glob::new(pattern).map_err(|e| {
                ConfigError::Validation(format!("Invalid exclude pattern '{}': {}", pattern, e))
            })?;
        }

        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
