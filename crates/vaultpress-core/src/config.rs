//! Configuration types for vaultpress.
//!
//! Follows a builder pattern for complex configuration with validation.
//! The configuration is persisted as YAML and passed explicitly to every
//! component that needs it.

use crate::error::{Error, Result};
use crate::utils::expand_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Front matter template used when a note has none
pub const DEFAULT_FRONT_MATTER_TEMPLATE: &str =
    "---\ntitle: {{title}}\ndate: {{date}}\ntags: {{tags}}\n---\n";

/// Default OpenAI-compatible endpoint
pub const DEFAULT_TAG_SERVICE_URL: &str = "https://api.openai.com/v1";

/// Default completion model
pub const DEFAULT_TAG_MODEL: &str = "gpt-3.5-turbo";

/// Configuration for the optional tag suggestion service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TagServiceConfig {
    /// Base URL, `/chat/completions` is appended
    pub base_url: String,
    /// Model name sent with every request
    pub model: String,
    /// Bearer token
    pub api_key: String,
    /// Generate tags automatically when a note has none
    pub enabled: bool,
}

impl Default for TagServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TAG_SERVICE_URL.to_string(),
            model: DEFAULT_TAG_MODEL.to_string(),
            api_key: String::new(),
            enabled: false,
        }
    }
}

impl TagServiceConfig {
    /// Enabled and usable (an API key is present)
    pub fn is_active(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }

    /// Full completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportConfig {
    /// Known site roots
    pub target_folders: Vec<PathBuf>,
    /// Site root that exports are written to
    pub active_target: Option<PathBuf>,
    /// Template applied to notes without front matter
    pub front_matter_template: String,
    /// Folder (relative to the site root) that embedded images are copied to
    pub image_folder: String,
    /// Vault paths skipped when indexing assets
    pub exclude_patterns: Vec<String>,
    /// Write the final front matter back into the source note
    pub mirror_to_source: bool,
    pub tag_service: TagServiceConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            target_folders: vec![],
            active_target: None,
            front_matter_template: DEFAULT_FRONT_MATTER_TEMPLATE.to_string(),
            image_folder: "assets/images".to_string(),
            exclude_patterns: [".obsidian", ".git", ".trash", "node_modules"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mirror_to_source: true,
            tag_service: TagServiceConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Create new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new config with builder
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder::new()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let image_folder = Path::new(&self.image_folder);
        if self.image_folder.trim().is_empty() {
            return Err(Error::config_error("Image folder cannot be empty"));
        }
        if image_folder.is_absolute() {
            return Err(Error::config_error(
                "Image folder must be relative to the target folder",
            ));
        }

        if let Some(active) = &self.active_target
            && !self.target_folders.contains(active)
        {
            return Err(Error::config_error(format!(
                "Active target folder is not in the target folder list: {}",
                active.display()
            )));
        }

        if self.tag_service.enabled && self.tag_service.base_url.trim().is_empty() {
            return Err(Error::config_error(
                "Tag service is enabled but has no base URL",
            ));
        }

        Ok(())
    }

    /// The configured active target, without touching the file system
    pub fn active_target(&self) -> Result<&Path> {
        self.active_target
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(Error::NoTargetConfigured)
    }

    /// The active target, verified to be an existing directory
    pub fn reachable_target(&self) -> Result<PathBuf> {
        let target = expand_path(self.active_target()?)?;
        if !target.is_dir() {
            return Err(Error::target_unreachable(target));
        }
        Ok(target)
    }

    /// Register a target folder. The first folder added becomes active.
    pub fn add_target_folder(&mut self, path: &Path) -> Result<PathBuf> {
        let expanded = expand_path(path)?;
        if !expanded.is_dir() {
            return Err(Error::config_error(format!(
                "Invalid folder path: {}",
                expanded.display()
            )));
        }
        if self.target_folders.contains(&expanded) {
            return Err(Error::config_error(format!(
                "Folder already registered: {}",
                expanded.display()
            )));
        }

        self.target_folders.push(expanded.clone());
        if self.target_folders.len() == 1 {
            self.active_target = Some(expanded.clone());
        }
        log::info!("Added target folder {}", expanded.display());
        Ok(expanded)
    }

    /// Remove a target folder; if it was active the first remaining one takes over
    pub fn remove_target_folder(&mut self, path: &Path) -> Result<()> {
        let expanded = expand_path(path)?;
        let before = self.target_folders.len();
        self.target_folders.retain(|p| p != &expanded);
        if self.target_folders.len() == before {
            return Err(Error::config_error(format!(
                "Folder is not registered: {}",
                expanded.display()
            )));
        }

        if self.active_target.as_ref() == Some(&expanded) {
            self.active_target = self.target_folders.first().cloned();
        }
        Ok(())
    }

    /// Switch the active target to a registered folder
    pub fn set_active_target(&mut self, path: &Path) -> Result<()> {
        let expanded = expand_path(path)?;
        if !self.target_folders.contains(&expanded) {
            return Err(Error::config_error(format!(
                "Folder is not registered: {}",
                expanded.display()
            )));
        }
        if !expanded.is_dir() {
            log::warn!("Selected folder does not exist: {}", expanded.display());
        }
        self.active_target = Some(expanded);
        Ok(())
    }

    /// Save configuration to a YAML file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| Error::config_error(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(path, yaml).await.map_err(|e| {
            Error::config_error(format!(
                "Failed to save config to {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load configuration from a YAML file, defaults if it does not exist
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::config_error(format!(
                "Failed to load config from {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::config_error(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

/// Builder for ExportConfig
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: ExportConfig::default(),
        }
    }

    /// Register a target folder and make it active
    pub fn target(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !self.config.target_folders.contains(&path) {
            self.config.target_folders.push(path.clone());
        }
        self.config.active_target = Some(path);
        self
    }

    pub fn front_matter_template(mut self, template: impl Into<String>) -> Self {
        self.config.front_matter_template = template.into();
        self
    }

    pub fn image_folder(mut self, folder: impl Into<String>) -> Self {
        self.config.image_folder = folder.into();
        self
    }

    pub fn exclude_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.exclude_patterns.push(pattern.into());
        self
    }

    pub fn mirror_to_source(mut self, mirror: bool) -> Self {
        self.config.mirror_to_source = mirror;
        self
    }

    pub fn tag_service(mut self, tag_service: TagServiceConfig) -> Self {
        self.config.tag_service = tag_service;
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<ExportConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ExportConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
