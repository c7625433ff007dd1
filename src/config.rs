//! Application configuration
//!
//! One TOML file declares the general settings and the ordered list of data
//! sources. The source registry re-reads the same file on reload.

use crate::module::landmark::DataSource;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Name of the source selected at startup; defaults to the first
    /// enabled source when unset.
    #[serde(default)]
    pub default_source: Option<String>,

    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_update_interval_minutes")]
    pub update_interval_minutes: u64,
}

fn default_cache_dir() -> String {
    "data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_update_interval_minutes() -> u64 {
    60
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_source: None,
            cache_dir: default_cache_dir(),
            log_level: default_log_level(),
            update_interval_minutes: default_update_interval_minutes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub sources: Vec<DataSource>,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file {:?}", path))?;
        let config: AppConfig =
            toml::from_str(&content).context(format!("Failed to parse config file {:?}", path))?;
        Ok(config)
    }

    /// The source to select at startup: the configured default, or the
    /// first enabled source.
    pub fn startup_source(&self) -> Option<String> {
        self.general
            .default_source
            .clone()
            .or_else(|| self.sources.iter().find(|s| s.enabled).map(|s| s.name.clone()))
    }
}
