//! Current-source selection
//!
//! The one piece of deliberately shared mutable state in the engine: which
//! source name queries resolve against. The check-and-set in `switch_to`
//! runs under a single write-lock acquisition, so concurrent readers see
//! either the old name or the new one, never an intermediate. A switch
//! racing an in-flight query may let that query finish against the
//! pre-switch source; source selection is eventually consistent by design.

use super::source::{DataSource, SourceRegistry};
use super::types::LandmarkError;
use std::sync::{Arc, RwLock};

pub struct SourceSelector {
    registry: Arc<SourceRegistry>,
    current: RwLock<String>,
}

impl SourceSelector {
    /// Create a selector pointing at `initial`, which must name an enabled
    /// source in the registry.
    pub fn new(registry: Arc<SourceRegistry>, initial: &str) -> Result<Self, LandmarkError> {
        match registry.get(initial) {
            Some(source) if source.enabled => Ok(Self {
                registry,
                current: RwLock::new(initial.to_string()),
            }),
            Some(_) => Err(LandmarkError::Config(format!(
                "default source '{}' is disabled",
                initial
            ))),
            None => Err(LandmarkError::Config(format!(
                "default source '{}' is not configured",
                initial
            ))),
        }
    }

    /// Name of the currently selected source.
    pub fn current_name(&self) -> String {
        self.current
            .read()
            .expect("current source lock poisoned")
            .clone()
    }

    /// Descriptor of the currently selected source. `None` only if a reload
    /// removed the source after it was selected.
    pub fn current(&self) -> Option<DataSource> {
        self.registry.get(&self.current_name())
    }

    /// Switch to another source. Succeeds only for a name that exists in the
    /// registry and is enabled; on failure the selection is left unchanged.
    pub fn switch_to(&self, name: &str) -> bool {
        let mut current = self.current.write().expect("current source lock poisoned");
        match self.registry.get(name) {
            Some(source) if source.enabled => {
                tracing::info!("Switching data source: {} -> {}", *current, name);
                *current = name.to_string();
                true
            }
            Some(_) => {
                tracing::warn!("Refusing to switch to disabled source '{}'", name);
                false
            }
            None => {
                tracing::warn!("Refusing to switch to unknown source '{}'", name);
                false
            }
        }
    }

    /// Switch targets offered to the user: enabled sources only, in
    /// configured order.
    pub fn switch_targets(&self) -> Vec<DataSource> {
        self.registry.all().into_iter().filter(|s| s.enabled).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_registry() -> (tempfile::TempDir, Arc<SourceRegistry>) {
        let dir = tempfile::TempDir::new().unwrap();
        let path: PathBuf = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[[sources]]
name = "official"
mode = "json"
url = "https://example.com/landmarks.json"

[[sources]]
name = "backup"
mode = "json"
url = "https://backup.example.com/landmarks.json"

[[sources]]
name = "retired"
mode = "json"
url = "https://old.example.com/landmarks.json"
enabled = false
"#,
        )
        .unwrap();
        (dir, Arc::new(SourceRegistry::load(&path).unwrap()))
    }

    #[test]
    fn test_switch_to_enabled_source() {
        let (_dir, registry) = test_registry();
        let selector = SourceSelector::new(registry, "official").unwrap();
        assert!(selector.switch_to("backup"));
        assert_eq!(selector.current_name(), "backup");
        assert_eq!(selector.current().unwrap().name, "backup");
    }

    #[test]
    fn test_switch_to_disabled_source_is_rejected() {
        let (_dir, registry) = test_registry();
        let selector = SourceSelector::new(registry, "official").unwrap();
        assert!(!selector.switch_to("retired"));
        assert_eq!(selector.current_name(), "official");
    }

    #[test]
    fn test_switch_to_unknown_source_is_rejected() {
        let (_dir, registry) = test_registry();
        let selector = SourceSelector::new(registry, "official").unwrap();
        assert!(!selector.switch_to("nope"));
        assert_eq!(selector.current_name(), "official");
    }

    #[test]
    fn test_disabled_default_is_rejected() {
        let (_dir, registry) = test_registry();
        assert!(SourceSelector::new(registry, "retired").is_err());
    }

    #[test]
    fn test_switch_targets_exclude_disabled() {
        let (_dir, registry) = test_registry();
        let selector = SourceSelector::new(registry, "official").unwrap();
        let targets: Vec<String> = selector
            .switch_targets()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(targets, vec!["official", "backup"]);
    }
}
