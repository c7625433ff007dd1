//! Local cache store for JSON-mode sources
//!
//! One snapshot file per source under the cache directory, written with a
//! temp-file-then-rename so concurrent readers only ever see a complete
//! document. Reads fall back to the legacy shared file kept by pre-existing
//! single-source deployments before surfacing an error.

use super::fetch;
use super::source::DataSource;
use super::types::{landmarks_from_rows, Catalog, Landmark, LandmarkError, Snapshot};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

/// Shared cache file used before sources became individually cached.
const LEGACY_CACHE_FILE: &str = "landmarks.json";

/// Result of one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A newer snapshot was downloaded and installed.
    Updated,
    /// The cache already matches the latest reachable remote version.
    Unchanged,
    /// Every primary and mirror URL failed; the previous cache file is
    /// untouched and still served.
    Failed(String),
}

pub struct LandmarkCache {
    cache_dir: PathBuf,
    client: reqwest::Client,
}

impl LandmarkCache {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
            client: fetch::snapshot_client(),
        }
    }

    /// Deterministic cache file path for one source name.
    pub fn cache_file_path(&self, source_name: &str) -> PathBuf {
        let file_stem: String = source_name
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.cache_dir.join(format!("{}.json", file_stem))
    }

    fn legacy_file_path(&self) -> PathBuf {
        self.cache_dir.join(LEGACY_CACHE_FILE)
    }

    /// Read and parse the cached snapshot for a source, falling back to the
    /// legacy shared file when the per-source file cannot be read.
    async fn cached_snapshot(&self, source_name: &str) -> Result<Snapshot> {
        let primary_path = self.cache_file_path(source_name);
        match Self::read_snapshot_file(&primary_path).await {
            Ok(snapshot) => Ok(snapshot),
            Err(primary_err) => {
                let legacy_path = self.legacy_file_path();
                if legacy_path == primary_path {
                    return Err(primary_err);
                }
                tracing::debug!(
                    "Cache read for '{}' failed ({}), trying legacy file",
                    source_name,
                    primary_err
                );
                Self::read_snapshot_file(&legacy_path)
                    .await
                    .map_err(|_| primary_err)
            }
        }
    }

    async fn read_snapshot_file(path: &Path) -> Result<Snapshot> {
        let content = fs::read_to_string(path)
            .await
            .context(format!("Failed to read cache file {:?}", path))?;
        serde_json::from_str(&content).context(format!("Failed to parse cache file {:?}", path))
    }

    /// Version marker of the cached snapshot, if a readable cache exists.
    pub async fn cached_version(&self, source_name: &str) -> Option<String> {
        self.cached_snapshot(source_name).await.ok()?.version
    }

    /// Whether the cache needs a sync: no readable cache, no recorded
    /// version, or a version that differs from the latest one discoverable
    /// from the source's URLs.
    ///
    /// When no URL is reachable the cache is reported fresh, so the stale
    /// copy keeps being served instead of triggering a doomed download.
    pub async fn is_stale(&self, source: &DataSource) -> bool {
        let cached = match self.cached_version(&source.name).await {
            Some(version) => version,
            None => return true,
        };

        match self.latest_remote_version(source).await {
            Some(remote) => remote != cached,
            None => false,
        }
    }

    /// Latest version discoverable from the primary URL, then each mirror.
    async fn latest_remote_version(&self, source: &DataSource) -> Option<String> {
        for url in source.all_urls() {
            match fetch::probe_version(&self.client, url).await {
                Ok(version) => return version,
                Err(e) => {
                    tracing::debug!("Version probe failed for {}: {}", url, e);
                }
            }
        }
        None
    }

    /// Bring the cache up to date when stale.
    ///
    /// Downloads from the primary URL first, then each mirror in order. The
    /// new snapshot is written to a temporary path and renamed over the old
    /// file, so a failure at any point leaves the previous cache intact.
    pub async fn sync_if_needed(&self, source: &DataSource) -> SyncOutcome {
        if !self.is_stale(source).await {
            tracing::debug!("Cache for '{}' is up to date", source.name);
            return SyncOutcome::Unchanged;
        }

        let mut last_error = String::from("source has no URLs configured");
        for url in source.all_urls() {
            match fetch::fetch_snapshot(&self.client, url).await {
                Ok((snapshot, body)) => {
                    if let Err(e) = self.install_snapshot(&source.name, &body).await {
                        last_error = format!("failed to write cache from {}: {}", url, e);
                        tracing::warn!("{}", last_error);
                        continue;
                    }
                    tracing::info!(
                        "Synced '{}' from {} (version {})",
                        source.name,
                        url,
                        snapshot.version.as_deref().unwrap_or("unknown")
                    );
                    return SyncOutcome::Updated;
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!("Snapshot download failed for {}: {}", url, e);
                }
            }
        }

        tracing::error!(
            "Sync failed for '{}', serving previous cache: {}",
            source.name,
            last_error
        );
        SyncOutcome::Failed(last_error)
    }

    /// Write the snapshot atomically: temp file in the same directory, then
    /// rename over the final path. Each install gets its own temp name so
    /// overlapping syncs of one source (background refresh racing an
    /// on-demand sync) cannot consume each other's temp file; last rename
    /// wins and both installs succeed.
    async fn install_snapshot(&self, source_name: &str, body: &str) -> Result<()> {
        static INSTALL_SEQ: AtomicU64 = AtomicU64::new(0);

        fs::create_dir_all(&self.cache_dir)
            .await
            .context(format!("Failed to create cache directory {:?}", self.cache_dir))?;

        let final_path = self.cache_file_path(source_name);
        let tmp_path = final_path.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            INSTALL_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        fs::write(&tmp_path, body)
            .await
            .context(format!("Failed to write temp cache file {:?}", tmp_path))?;
        fs::rename(&tmp_path, &final_path)
            .await
            .context(format!("Failed to install cache file {:?}", final_path))?;

        Ok(())
    }

    /// Parse the cached snapshot's sub-array for one catalog.
    ///
    /// Fails with `DataUnavailable` when neither the per-source nor the
    /// legacy cache file is readable, or when the catalog key is missing
    /// from the document.
    pub async fn read_cached(
        &self,
        source_name: &str,
        catalog: Catalog,
    ) -> Result<Vec<Landmark>, LandmarkError> {
        let snapshot = self
            .cached_snapshot(source_name)
            .await
            .map_err(|e| LandmarkError::DataUnavailable(e.to_string()))?;

        let rows = snapshot.catalog(catalog).ok_or_else(|| {
            LandmarkError::DataUnavailable(format!(
                "cache for '{}' has no '{}' catalog",
                source_name, catalog
            ))
        })?;

        Ok(landmarks_from_rows(rows))
    }
}
