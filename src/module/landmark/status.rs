//! Liveness checks for API-mode sources
//!
//! A single bounded request against the API base URL, reporting latency on
//! success and a human-readable reason on failure. Never returns an error;
//! an unreachable API is a status, not a fault.

use super::source::DataSource;
use super::types::SourceStatus;
use std::time::{Duration, Instant};

const STATUS_TIMEOUT_SECONDS: u64 = 10;

/// Check whether an API-mode source answers at all, without touching the
/// cache.
pub async fn check_source_status(client: &reqwest::Client, source: &DataSource) -> SourceStatus {
    let base_url = match source.api_base_url.as_deref() {
        Some(url) => url,
        None => {
            return SourceStatus {
                text: format!("source '{}' has no API base URL", source.name),
                reachable: false,
                latency: None,
            }
        }
    };

    let started = Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(STATUS_TIMEOUT_SECONDS),
        client.get(base_url).send(),
    )
    .await;

    match result {
        Ok(Ok(response)) => {
            let latency = started.elapsed();
            let reachable = response.status().is_success();
            let text = if reachable {
                format!("online, {} ms", latency.as_millis())
            } else {
                format!("responded with HTTP {}", response.status())
            };
            SourceStatus {
                text,
                reachable,
                latency: Some(latency),
            }
        }
        Ok(Err(e)) => SourceStatus {
            text: format!("unreachable: {}", e),
            reachable: false,
            latency: None,
        },
        Err(_) => SourceStatus {
            text: format!("timed out after {}s", STATUS_TIMEOUT_SECONDS),
            reachable: false,
            latency: None,
        },
    }
}
