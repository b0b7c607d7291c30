//! Extension configuration storage

use crate::error::{ExtensionError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "BITWARDEN_EXTENSION_CONFIG";

/// App group shared between the main app and the extension
pub const DEFAULT_APP_GROUP: &str = "group.com.8bit.bitwarden";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    #[serde(default = "default_app_group")]
    pub app_group: String,
    /// Root directory for app-group containers; defaults to the config directory
    #[serde(default)]
    pub settings_dir: Option<PathBuf>,
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
    /// Let the next matcher try an attachment whose web page payload has no
    /// preprocessing results
    #[serde(default)]
    pub allow_web_url_fallback: bool,
}

fn default_app_group() -> String {
    DEFAULT_APP_GROUP.to_string()
}

fn default_load_timeout_ms() -> u64 {
    30_000
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            app_group: default_app_group(),
            settings_dir: None,
            load_timeout_ms: default_load_timeout_ms(),
            allow_web_url_fallback: false,
        }
    }
}

impl ExtensionConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Directory holding the shared settings for this app group
    pub fn app_group_dir(&self) -> Result<PathBuf> {
        let root = match &self.settings_dir {
            Some(dir) => dir.clone(),
            None => config_dir()?,
        };
        Ok(root.join(&self.app_group))
    }
}

fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| ExtensionError::ConfigError("home directory not found".to_string()))?;
    Ok(PathBuf::from(home).join(".bitwarden-extension"))
}

fn config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(config_dir()?.join("config.json"))
}

pub fn load_config() -> Result<ExtensionConfig> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<ExtensionConfig> {
    if !path.exists() {
        return Ok(ExtensionConfig::default());
    }

    let content =
        fs::read_to_string(path).map_err(|e| ExtensionError::ConfigError(e.to_string()))?;

    serde_json::from_str(&content).map_err(|e| ExtensionError::ConfigError(e.to_string()))
}

pub fn save_config(config: &ExtensionConfig) -> Result<()> {
    save_config_to(config, &config_path()?)
}

pub fn save_config_to(config: &ExtensionConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| ExtensionError::ConfigError(e.to_string()))?;
        }
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| ExtensionError::ConfigError(e.to_string()))?;

    fs::write(path, content).map_err(|e| ExtensionError::ConfigError(e.to_string()))
}
