use landmark_backend::config::AppConfig;
use landmark_backend::logging;
use landmark_backend::module::landmark::{
    check_all_mirrors, check_source_status, snapshot_client, LandmarkCache, SourceMode,
    SourceRegistry, SourceSelector, SourceUpdater,
};

use anyhow::Result;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    // Load configuration
    let config = AppConfig::from_file(&config_path)?;

    // Initialize logging
    let _logging_guard = logging::init_logging("logs", "landmark-backend", &config.general.log_level);

    tracing::info!("Landmark backend starting...");

    let registry = Arc::new(SourceRegistry::load(&config_path)?);
    let cache = Arc::new(LandmarkCache::new(&config.general.cache_dir));

    let startup_source = config
        .startup_source()
        .ok_or_else(|| anyhow::anyhow!("configuration declares no enabled source"))?;
    let selector = SourceSelector::new(registry.clone(), &startup_source)?;
    tracing::info!("Active source: {}", selector.current_name());

    // Report liveness of the active source before the first sync.
    if let Some(source) = selector.current() {
        let client = snapshot_client();
        match source.mode {
            SourceMode::Json => {
                for status in check_all_mirrors(&client, &source).await {
                    tracing::info!(
                        "Mirror {} ({}): {} {}",
                        status.url,
                        if status.is_primary { "primary" } else { "mirror" },
                        if status.is_available { "available" } else { "unavailable" },
                        status.version.as_deref().unwrap_or(""),
                    );
                }
            }
            SourceMode::Api => {
                let status = check_source_status(&client, &source).await;
                tracing::info!("API source '{}': {}", source.name, status.text);
            }
        }
    }

    // Initial sync of every enabled JSON source, then the periodic loop.
    let updater = SourceUpdater::new(
        registry,
        cache,
        config.general.update_interval_minutes,
    );
    let handle = updater.start_with_initial_sync().await;
    tracing::info!("Source updater started");

    handle.await?;
    Ok(())
}
