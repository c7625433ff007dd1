//! Snapshot download and version probing
//!
//! Shared HTTP plumbing for the cache store and the mirror prober. A probe
//! deserializes only the embedded `version` marker; a full fetch validates
//! the whole document before the raw bytes are handed to the cache.

use super::types::Snapshot;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

const FETCH_TIMEOUT_SECONDS: u64 = 30;

/// HTTP client configured for snapshot traffic.
pub fn snapshot_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECONDS))
        .build()
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: Option<String>,
}

/// Fetch only the version marker of the snapshot at `url`.
pub async fn probe_version(client: &reqwest::Client, url: &str) -> Result<Option<String>> {
    let response = client
        .get(url)
        .send()
        .await
        .context(format!("Failed to reach {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {} from {}", response.status(), url);
    }

    let probe: VersionProbe = response
        .json()
        .await
        .context(format!("Failed to parse snapshot metadata from {}", url))?;

    Ok(probe.version)
}

/// Download and validate a full snapshot document.
///
/// Returns the parsed document together with the raw body, so the cache can
/// persist exactly the bytes the server sent.
pub async fn fetch_snapshot(client: &reqwest::Client, url: &str) -> Result<(Snapshot, String)> {
    tracing::debug!("Fetching snapshot from {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .context(format!("Failed to reach {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {} from {}", response.status(), url);
    }

    let body = response
        .text()
        .await
        .context(format!("Failed to read snapshot body from {}", url))?;

    let snapshot: Snapshot = serde_json::from_str(&body)
        .context(format!("Snapshot from {} is not a valid document", url))?;

    Ok((snapshot, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Connection-refused failures come back quickly, so unreachable
    // loopback URLs stand in for dead mirrors.
    const DEAD_URL: &str = "http://127.0.0.1:9/landmarks.json";

    #[tokio::test]
    async fn test_probe_unreachable_url_fails() {
        let client = snapshot_client();
        assert!(probe_version(&client, DEAD_URL).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_unreachable_url_fails() {
        let client = snapshot_client();
        assert!(fetch_snapshot(&client, DEAD_URL).await.is_err());
    }
}
