//! Background refresh of JSON-mode source caches
//!
//! Periodically re-syncs every enabled JSON source, each cycle bounded by a
//! timeout so one stuck download cannot wedge the loop. Runs entirely on a
//! spawned task; callers keep the `JoinHandle`.

use super::cache::{LandmarkCache, SyncOutcome};
use super::source::{SourceMode, SourceRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const CYCLE_TIMEOUT_SECONDS: u64 = 300;

/// Outcome counts for one refresh cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

pub struct SourceUpdater {
    registry: Arc<SourceRegistry>,
    cache: Arc<LandmarkCache>,
    interval_minutes: u64,
}

impl SourceUpdater {
    pub fn new(
        registry: Arc<SourceRegistry>,
        cache: Arc<LandmarkCache>,
        interval_minutes: u64,
    ) -> Self {
        Self {
            registry,
            cache,
            interval_minutes,
        }
    }

    /// Run one cycle immediately, then hand off to the scheduled loop.
    pub async fn start_with_initial_sync(self) -> JoinHandle<()> {
        tracing::info!("Starting source updater (initial sync + schedule)");
        self.run_cycle_bounded().await;
        self.start()
    }

    /// Start the scheduled loop without an initial sync.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let interval = Duration::from_secs(self.interval_minutes * 60);
            loop {
                let next = chrono::Utc::now() + chrono::Duration::minutes(self.interval_minutes as i64);
                tracing::info!(
                    "Next source refresh at {}",
                    next.format("%Y-%m-%d %H:%M:%S UTC")
                );
                tokio::time::sleep(interval).await;
                self.run_cycle_bounded().await;
            }
        })
    }

    async fn run_cycle_bounded(&self) {
        match tokio::time::timeout(
            Duration::from_secs(CYCLE_TIMEOUT_SECONDS),
            self.run_cycle(),
        )
        .await
        {
            Ok(report) => {
                tracing::info!(
                    "Source refresh complete: {} updated, {} unchanged, {} failed",
                    report.updated,
                    report.unchanged,
                    report.failed
                );
            }
            Err(_) => {
                tracing::error!(
                    "Source refresh timed out after {}s",
                    CYCLE_TIMEOUT_SECONDS
                );
            }
        }
    }

    /// Sync every enabled JSON-mode source once.
    pub async fn run_cycle(&self) -> RefreshReport {
        let mut report = RefreshReport::default();

        for source in self.registry.all() {
            if !source.enabled || source.mode != SourceMode::Json {
                continue;
            }

            match self.cache.sync_if_needed(&source).await {
                SyncOutcome::Updated => {
                    report.updated += 1;
                    // Record the version the source was synced at; the one
                    // sanctioned post-load mutation of a DataSource.
                    let version = self.cache.cached_version(&source.name).await;
                    self.registry.set_version(&source.name, version);
                }
                SyncOutcome::Unchanged => report.unchanged += 1,
                SyncOutcome::Failed(reason) => {
                    tracing::warn!("Refresh failed for '{}': {}", source.name, reason);
                    report.failed += 1;
                }
            }
        }

        report
    }
}
