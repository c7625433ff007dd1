//! Data source descriptors and the source registry
//!
//! A `DataSource` is one named, configured origin for landmark records. The
//! registry owns the full table, loaded from the configuration file, and
//! supports atomic reload: readers always observe either the previous table
//! or the new one, never a partially-updated mix.

use super::types::LandmarkError;
use crate::config::AppConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Which backend a source is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Json,
    Api,
}

/// One configured origin for landmark records.
///
/// Immutable during a session except for `version`, which the cache layer
/// refreshes through the registry after a successful sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    pub mode: SourceMode,
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Primary snapshot URL, JSON mode only.
    #[serde(default)]
    pub url: Option<String>,
    /// Ordered failover URLs serving the same snapshot, JSON mode only.
    #[serde(default)]
    pub mirror_urls: Vec<String>,
    /// Query API base URL, API mode only.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Last-known remote version tag, refreshed after a successful sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl DataSource {
    /// Primary URL followed by mirrors, in configured order. Empty for
    /// API-mode sources.
    pub fn all_urls(&self) -> Vec<&str> {
        let mut urls = Vec::with_capacity(1 + self.mirror_urls.len());
        if let Some(url) = self.url.as_deref() {
            urls.push(url);
        }
        urls.extend(self.mirror_urls.iter().map(String::as_str));
        urls
    }

    fn validate(&self) -> Result<(), LandmarkError> {
        match self.mode {
            SourceMode::Json if self.url.is_none() => Err(LandmarkError::Config(format!(
                "source '{}' is in json mode but has no url",
                self.name
            ))),
            SourceMode::Api if self.api_base_url.is_none() => Err(LandmarkError::Config(
                format!("source '{}' is in api mode but has no api_base_url", self.name),
            )),
            _ => Ok(()),
        }
    }
}

/// Registry of all configured sources, keyed by name, in configured order.
pub struct SourceRegistry {
    config_path: PathBuf,
    sources: RwLock<Arc<Vec<DataSource>>>,
}

impl SourceRegistry {
    /// Load the registry from the configuration file.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self, LandmarkError> {
        let config_path = config_path.as_ref().to_path_buf();
        let sources = Self::parse_sources(&config_path)?;

        tracing::info!(
            "Loaded {} data sources from {:?}",
            sources.len(),
            config_path
        );

        Ok(Self {
            config_path,
            sources: RwLock::new(Arc::new(sources)),
        })
    }

    fn parse_sources(config_path: &Path) -> Result<Vec<DataSource>, LandmarkError> {
        let config = AppConfig::from_file(config_path)
            .map_err(|e| LandmarkError::Config(e.to_string()))?;

        if config.sources.is_empty() {
            return Err(LandmarkError::Config(
                "configuration declares no data sources".to_string(),
            ));
        }

        for source in &config.sources {
            source.validate()?;
        }
        for (i, source) in config.sources.iter().enumerate() {
            if config.sources[..i].iter().any(|s| s.name == source.name) {
                return Err(LandmarkError::Config(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
        }

        Ok(config.sources)
    }

    /// Look up one source by name.
    pub fn get(&self, name: &str) -> Option<DataSource> {
        self.sources
            .read()
            .expect("source table lock poisoned")
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }

    /// All sources in configured order, disabled ones included.
    pub fn all(&self) -> Vec<DataSource> {
        self.sources
            .read()
            .expect("source table lock poisoned")
            .as_ref()
            .clone()
    }

    /// Re-parse the configuration file and swap the table atomically.
    ///
    /// On any parse or validation failure the previous table is retained and
    /// `false` is returned.
    pub fn reload(&self) -> bool {
        match Self::parse_sources(&self.config_path) {
            Ok(sources) => {
                tracing::info!("Reloaded {} data sources", sources.len());
                *self.sources.write().expect("source table lock poisoned") = Arc::new(sources);
                true
            }
            Err(e) => {
                tracing::warn!("Source reload failed, keeping previous table: {}", e);
                false
            }
        }
    }

    /// Record the remote version a source was last synced at. The one
    /// sanctioned post-load mutation.
    pub fn set_version(&self, name: &str, version: Option<String>) {
        let mut table = self.sources.write().expect("source table lock poisoned");
        let mut sources = table.as_ref().clone();
        if let Some(source) = sources.iter_mut().find(|s| s.name == name) {
            source.version = version;
            *table = Arc::new(sources);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    const VALID_CONFIG: &str = r#"
[general]
default_source = "official"

[[sources]]
name = "official"
mode = "json"
url = "https://example.com/landmarks.json"
mirror_urls = ["https://mirror.example.com/landmarks.json"]

[[sources]]
name = "community-api"
mode = "api"
api_base_url = "https://api.example.com"
enabled = false
"#;

    #[test]
    fn test_load_and_lookup() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(&dir, VALID_CONFIG);

        let registry = SourceRegistry::load(&path).unwrap();
        let all = registry.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "official");
        assert_eq!(all[1].name, "community-api");
        assert!(!all[1].enabled);

        let official = registry.get("official").unwrap();
        assert_eq!(official.mode, SourceMode::Json);
        assert_eq!(
            official.all_urls(),
            vec![
                "https://example.com/landmarks.json",
                "https://mirror.example.com/landmarks.json"
            ]
        );

        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_json_source_without_url_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[[sources]]
name = "broken"
mode = "json"
"#,
        );
        assert!(matches!(
            SourceRegistry::load(&path),
            Err(LandmarkError::Config(_))
        ));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[[sources]]
name = "dup"
mode = "json"
url = "https://example.com/a.json"

[[sources]]
name = "dup"
mode = "json"
url = "https://example.com/b.json"
"#,
        );
        assert!(matches!(
            SourceRegistry::load(&path),
            Err(LandmarkError::Config(_))
        ));
    }

    #[test]
    fn test_failed_reload_retains_previous_table() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(&dir, VALID_CONFIG);
        let registry = SourceRegistry::load(&path).unwrap();

        std::fs::write(&path, "this is not toml [").unwrap();
        assert!(!registry.reload());
        assert_eq!(registry.all().len(), 2);
        assert!(registry.get("official").is_some());
    }

    #[test]
    fn test_successful_reload_swaps_table() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(&dir, VALID_CONFIG);
        let registry = SourceRegistry::load(&path).unwrap();

        std::fs::write(
            &path,
            r#"
[[sources]]
name = "replacement"
mode = "json"
url = "https://example.com/new.json"
"#,
        )
        .unwrap();
        assert!(registry.reload());
        assert_eq!(registry.all().len(), 1);
        assert!(registry.get("official").is_none());
        assert!(registry.get("replacement").is_some());
    }

    #[test]
    fn test_set_version() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(&dir, VALID_CONFIG);
        let registry = SourceRegistry::load(&path).unwrap();

        registry.set_version("official", Some("2.1.0".to_string()));
        assert_eq!(
            registry.get("official").unwrap().version,
            Some("2.1.0".to_string())
        );
    }
}
