//! Configuration management for huddle
//!
//! Loads and saves the model, platform and driver settings from
//! `~/.huddle/config.json`, and reads the tool manifest.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod manifest;
pub mod paths;

pub use manifest::{ToolManifest, ToolSpec};
pub use paths::{config_path, data_dir, manifest_path, threads_dir};

/// Errors in configuration handling
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG IO ERROR: {0}")]
    Io(#[from] std::io::Error),

    #[error("CONFIG PARSE FAILED: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CONFIG NOT FOUND: {0}")]
    NotFound(PathBuf),

    #[error("INVALID CONFIG: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Chat-completion endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_model_base(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_model_base() -> String {
    "https://integrate.api.nvidia.com/v1".to_string()
}

fn default_model() -> String {
    "meta/llama-3.1-70b-instruct".to_string()
}

fn default_temperature() -> f32 {
    0.0
}

fn default_max_tokens() -> u32 {
    4096
}

/// Agent platform settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_platform_base")]
    pub api_base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_platform_base(),
            agent_id: None,
        }
    }
}

fn default_platform_base() -> String {
    "https://inbound.xpander.ai".to_string()
}

/// Conversation driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            manifest: default_manifest(),
        }
    }
}

fn default_max_iterations() -> u32 {
    20
}

fn default_manifest() -> String {
    "~/.huddle/tools.json".to_string()
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

impl Config {
    /// Load from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from specific location, falling back to defaults when absent
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("◆ NO CONFIG FOUND AT {:?}, USING DEFAULTS", path);
            return Ok(Config::default());
        }

        debug!("◆ READING CONFIG FROM {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("◆ WRITING CONFIG TO {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Completion endpoint key, if set
    pub fn model_api_key(&self) -> Option<String> {
        non_empty(&self.model.api_key)
    }

    /// Platform key, if set
    pub fn platform_api_key(&self) -> Option<String> {
        non_empty(&self.platform.api_key)
    }

    /// Agent id recorded by a previous provisioning run
    pub fn agent_id(&self) -> Option<String> {
        self.platform
            .agent_id
            .as_deref()
            .and_then(non_empty)
    }

    /// Resolved tool manifest path
    pub fn manifest_path(&self) -> PathBuf {
        paths::expand_home(&self.driver.manifest)
    }

    /// Iteration ceiling for the conversation driver
    pub fn max_iterations(&self) -> u32 {
        self.driver.max_iterations
    }

    /// Check the settings a run needs, returning every problem found
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.model_api_key().is_none() {
            problems.push("model.api_key is not set".to_string());
        }
        if self.platform_api_key().is_none() {
            problems.push("platform.api_key is not set".to_string());
        }
        if self.driver.max_iterations == 0 {
            problems.push("driver.max_iterations must be at least 1".to_string());
        }
        problems
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Initialize the data directory with a default config and example manifest
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("◆ CONFIG ALREADY EXISTS AT {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("◆ CONFIG WRITTEN TO {:?}", config_path);
    }

    let manifest_path = manifest_path();
    if manifest_path.exists() {
        warn!("◆ MANIFEST ALREADY EXISTS AT {:?}", manifest_path);
    } else {
        ToolManifest::example().save_to(&manifest_path).await?;
        info!("◆ EXAMPLE MANIFEST WRITTEN TO {:?}", manifest_path);
    }

    paths::ensure_dir(&threads_dir()).await?;

    Config::load().await
}
