use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::input::ValidationSeverity;

pub const CONFIG_VERSION: &str = "1.0";
pub const DEFAULT_CONFIG_FILE: &str = "scm-registry.toml";

/// Defaults applied to every new input model.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct InputSettings {
    pub default_placeholder: String,
    pub visible: bool,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            default_placeholder: String::new(),
            visible: true,
        }
    }
}

/// A regex check on the input text; the first matching rule wins.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ValidationRule {
    pub pattern: String,
    pub message: String,
    pub severity: ValidationSeverity,
}

/// A repository the CLI should open and register.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RepositoryEntry {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ScmSettings {
    pub version: String,
    pub log_level: String,
    pub input: InputSettings,
    pub validation: Vec<ValidationRule>,
    pub repositories: Vec<RepositoryEntry>,
}

impl Default for ScmSettings {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            log_level: "info".to_string(),
            input: InputSettings::default(),
            validation: Vec::new(),
            repositories: Vec::new(),
        }
    }
}

/// Serialisation formats accepted by `export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
    Toml,
}

impl ExportFormat {
    pub fn parse(format: &str) -> Result<Self> {
        match format.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            other => anyhow::bail!("Unsupported export format: {other}"),
        }
    }

    pub fn render<T: Serialize>(self, value: &T) -> Result<String> {
        match self {
            Self::Json => serde_json::to_string_pretty(value).context("Failed to serialize to JSON"),
            Self::Yaml => serde_yaml::to_string(value).context("Failed to serialize to YAML"),
            Self::Toml => toml::to_string_pretty(value).context("Failed to serialize to TOML"),
        }
    }
}

pub trait ConfigProvider {
    fn load_config(&self) -> Result<ScmSettings>;
    fn save_config(&self, config: &ScmSettings) -> Result<()>;
    fn get_config_path(&self) -> &Path;
}

/// Reads and writes the TOML settings file.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Uses `scm-registry.toml` in the current directory.
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to resolve current directory")?;
        Ok(Self::new_at(current_dir.join(DEFAULT_CONFIG_FILE)))
    }

    pub fn new_at(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Writes the default settings unless a file already exists.
    pub fn initialize(&self) -> Result<bool> {
        if self.config_path.exists() {
            return Ok(false);
        }
        self.save_config(&ScmSettings::default())?;
        Ok(true)
    }

    pub fn export(&self, target: &Path, format: ExportFormat) -> Result<()> {
        let config = self.load_config()?;
        let content = format.render(&config)?;
        fs::write(target, content).context("Failed to write export file")?;
        Ok(())
    }
}

impl ConfigProvider for ConfigManager {
    fn load_config(&self) -> Result<ScmSettings> {
        if !self.config_path.exists() {
            return Ok(ScmSettings::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file {}", self.config_path.display()))?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    fn save_config(&self, config: &ScmSettings) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(&self.config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
