//! Remote API client for API-mode sources
//!
//! Two logical operations are consumed: get-by-id (zero or one record) and
//! keyword search (record list). Payload rows carry the same fields as
//! snapshot rows and normalize through the same path.

use super::types::{landmarks_from_rows, Catalog, Landmark, LandmarkError, SnapshotRecord};
use std::time::Duration;

const REQUEST_TIMEOUT_SECONDS: u64 = 30;

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a single landmark by id. A 404 means "no such id", not a
    /// failure.
    pub async fn get_by_id(
        &self,
        catalog: Catalog,
        id: &str,
    ) -> Result<Option<Landmark>, LandmarkError> {
        let url = format!(
            "{}/landmark/{}/{}",
            self.base_url,
            catalog,
            urlencoding::encode(id)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LandmarkError::RemoteQueryFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LandmarkError::RemoteQueryFailed(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let record: Option<SnapshotRecord> = response
            .json()
            .await
            .map_err(|e| LandmarkError::RemoteQueryFailed(e.to_string()))?;

        Ok(record.map(Landmark::from))
    }

    /// Search landmarks by keyword. The remote side owns the matching
    /// semantics; malformed rows in the response are skipped.
    pub async fn search(
        &self,
        catalog: Catalog,
        keyword: &str,
    ) -> Result<Vec<Landmark>, LandmarkError> {
        let url = format!(
            "{}/landmark/{}/search?keyword={}",
            self.base_url,
            catalog,
            urlencoding::encode(keyword)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LandmarkError::RemoteQueryFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LandmarkError::RemoteQueryFailed(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| LandmarkError::RemoteQueryFailed(e.to_string()))?;

        Ok(landmarks_from_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_api_is_remote_query_failed() {
        let client = ApiClient::new("http://127.0.0.1:9");

        let by_id = client.get_by_id(Catalog::Zeroth, "1").await;
        assert!(matches!(by_id, Err(LandmarkError::RemoteQueryFailed(_))));

        let search = client.search(Catalog::Houtu, "雾桥").await;
        assert!(matches!(search, Err(LandmarkError::RemoteQueryFailed(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("https://api.example.com/");
        assert_eq!(client.base_url, "https://api.example.com");
    }

    #[tokio::test]
    #[ignore] // Requires network connection
    async fn test_get_by_id_live() {
        let client = ApiClient::new("https://api.example.com");
        let _ = client.get_by_id(Catalog::Zeroth, "1").await;
    }
}
