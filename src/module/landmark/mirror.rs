//! Concurrent mirror probing for JSON-mode sources
//!
//! Every configured URL is probed at the same time, each under its own
//! timeout, and the batch reports in configured order no matter which probe
//! finishes first. A slow or dead mirror degrades to `is_available = false`
//! without delaying the others.

use super::fetch;
use super::source::DataSource;
use super::types::MirrorStatus;
use futures::future::join_all;
use std::time::Duration;
use tokio::time::timeout;

/// Default per-probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Probe the primary URL and every mirror of a JSON-mode source.
///
/// Results come back in configured order with the primary first and flagged
/// `is_primary`. API-mode sources have no snapshot URLs and yield an empty
/// list.
pub async fn check_all_mirrors(client: &reqwest::Client, source: &DataSource) -> Vec<MirrorStatus> {
    check_all_mirrors_with_timeout(client, source, DEFAULT_PROBE_TIMEOUT).await
}

/// Same as `check_all_mirrors` with an explicit per-probe timeout.
pub async fn check_all_mirrors_with_timeout(
    client: &reqwest::Client,
    source: &DataSource,
    probe_timeout: Duration,
) -> Vec<MirrorStatus> {
    let probes = source
        .all_urls()
        .into_iter()
        .enumerate()
        .map(|(index, url)| probe_one(client, url.to_string(), index == 0, probe_timeout));

    // join_all preserves input order, so completion order never reorders
    // the report.
    join_all(probes).await
}

async fn probe_one(
    client: &reqwest::Client,
    url: String,
    is_primary: bool,
    probe_timeout: Duration,
) -> MirrorStatus {
    match timeout(probe_timeout, fetch::probe_version(client, &url)).await {
        Ok(Ok(version)) => MirrorStatus {
            url,
            is_primary,
            is_available: true,
            version,
            status_text: "ok".to_string(),
        },
        Ok(Err(e)) => MirrorStatus {
            url,
            is_primary,
            is_available: false,
            version: None,
            status_text: e.to_string(),
        },
        Err(_) => MirrorStatus {
            url,
            is_primary,
            is_available: false,
            version: None,
            status_text: format!("timed out after {:?}", probe_timeout),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::landmark::source::SourceMode;

    #[tokio::test]
    async fn test_results_stay_in_configured_order() {
        let source = DataSource {
            name: "official".to_string(),
            mode: SourceMode::Json,
            enabled: true,
            url: Some("http://127.0.0.1:9/a.json".to_string()),
            mirror_urls: vec![
                "http://127.0.0.1:9/b.json".to_string(),
                "http://127.0.0.1:9/c.json".to_string(),
            ],
            api_base_url: None,
            version: None,
        };

        let client = fetch::snapshot_client();
        let statuses = check_all_mirrors(&client, &source).await;

        assert_eq!(statuses.len(), 3);
        assert_eq!(statuses[0].url, "http://127.0.0.1:9/a.json");
        assert!(statuses[0].is_primary);
        assert!(!statuses[1].is_primary);
        assert!(!statuses[2].is_primary);
        assert_eq!(statuses[2].url, "http://127.0.0.1:9/c.json");

        // Dead mirrors degrade instead of failing the batch.
        assert!(statuses.iter().all(|s| !s.is_available));
        assert!(statuses.iter().all(|s| s.version.is_none()));
    }

    #[tokio::test]
    async fn test_slow_mirror_times_out_without_failing_the_batch() {
        // A listener that accepts connections but never answers stands in
        // for a hung mirror; the refused-port mirror answers immediately.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            // Hold accepted sockets open so the client keeps waiting.
            let mut sockets = Vec::new();
            loop {
                if let Ok((socket, _)) = listener.accept().await {
                    sockets.push(socket);
                }
            }
        });

        let source = DataSource {
            name: "official".to_string(),
            mode: SourceMode::Json,
            enabled: true,
            url: Some(format!("http://{}/landmarks.json", addr)),
            mirror_urls: vec!["http://127.0.0.1:9/b.json".to_string()],
            api_base_url: None,
            version: None,
        };

        let client = fetch::snapshot_client();
        let started = std::time::Instant::now();
        let statuses = check_all_mirrors_with_timeout(
            &client,
            &source,
            std::time::Duration::from_millis(200),
        )
        .await;
        hold.abort();

        // The hung probe is bounded by its own timeout, so the whole batch
        // comes back promptly.
        assert!(started.elapsed() < std::time::Duration::from_secs(5));

        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].is_primary);
        assert!(!statuses[0].is_available);
        assert!(statuses[0].status_text.contains("timed out"));
        assert!(!statuses[1].is_available);
    }

    #[tokio::test]
    async fn test_api_source_has_nothing_to_probe() {
        let source = DataSource {
            name: "community-api".to_string(),
            mode: SourceMode::Api,
            enabled: true,
            url: None,
            mirror_urls: Vec::new(),
            api_base_url: Some("http://127.0.0.1:9".to_string()),
            version: None,
        };

        let client = fetch::snapshot_client();
        assert!(check_all_mirrors(&client, &source).await.is_empty());
    }
}
