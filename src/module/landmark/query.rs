//! Unified landmark queries across JSON-cache and remote-API backends
//!
//! Both backends sit behind one trait; callers pick a `DataSource` and get
//! the same normalized records either way. Numeric queries fan out to the
//! id and name lookups concurrently and join before merging, so the merge
//! order is id-results-then-name-results no matter which leg finishes first.

use super::api_client::ApiClient;
use super::cache::{LandmarkCache, SyncOutcome};
use super::pinyin::to_phonetic_key;
use super::source::{DataSource, SourceMode};
use super::types::{Catalog, Landmark, LandmarkError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Query capability both backends provide.
#[async_trait]
pub trait LandmarkBackend: Send + Sync {
    /// Exact-id lookup. An absent id is an empty list, never an error.
    async fn by_id(&self, catalog: Catalog, id: &str) -> Result<Vec<Landmark>, LandmarkError>;

    /// Name lookup with phonetic fallback (see `QueryService` docs).
    async fn by_name_or_phonetic(
        &self,
        catalog: Catalog,
        keyword: &str,
    ) -> Result<Vec<Landmark>, LandmarkError>;
}

/// Backend over the local snapshot cache.
struct JsonBackend<'a> {
    cache: &'a LandmarkCache,
    source: &'a DataSource,
}

impl JsonBackend<'_> {
    /// Freshly-synced-or-cached candidate list. A failed sync is absorbed
    /// here: the stale cache keeps being served, and only an unreadable
    /// cache surfaces as `DataUnavailable`.
    async fn candidates(&self, catalog: Catalog) -> Result<Vec<Landmark>, LandmarkError> {
        if let SyncOutcome::Failed(reason) = self.cache.sync_if_needed(self.source).await {
            tracing::warn!(
                "Serving stale cache for '{}': {}",
                self.source.name,
                reason
            );
        }
        self.cache.read_cached(&self.source.name, catalog).await
    }
}

#[async_trait]
impl LandmarkBackend for JsonBackend<'_> {
    async fn by_id(&self, catalog: Catalog, id: &str) -> Result<Vec<Landmark>, LandmarkError> {
        let candidates = self.candidates(catalog).await?;
        Ok(candidates.into_iter().filter(|l| l.id == id).collect())
    }

    async fn by_name_or_phonetic(
        &self,
        catalog: Catalog,
        keyword: &str,
    ) -> Result<Vec<Landmark>, LandmarkError> {
        let candidates = self.candidates(catalog).await?;

        // Step 1: case-sensitive substring match on the origin-script name.
        let exact: Vec<Landmark> = candidates
            .iter()
            .filter(|l| l.name.contains(keyword))
            .cloned()
            .collect();
        if !exact.is_empty() {
            return Ok(exact);
        }

        // Step 2: phonetic fallback, only for purely ASCII-alphabetic
        // keywords and only when step 1 found nothing.
        if !is_ascii_alphabetic(keyword) {
            return Ok(exact);
        }
        let keyword_lower = keyword.to_lowercase();
        Ok(candidates
            .into_iter()
            .filter(|l| {
                to_phonetic_key(&l.name)
                    .to_lowercase()
                    .contains(&keyword_lower)
            })
            .collect())
    }
}

/// Backend over a remote query API. Matching semantics are owned by the
/// remote side.
struct ApiBackend {
    client: ApiClient,
}

#[async_trait]
impl LandmarkBackend for ApiBackend {
    async fn by_id(&self, catalog: Catalog, id: &str) -> Result<Vec<Landmark>, LandmarkError> {
        Ok(self
            .client
            .get_by_id(catalog, id)
            .await?
            .into_iter()
            .collect())
    }

    async fn by_name_or_phonetic(
        &self,
        catalog: Catalog,
        keyword: &str,
    ) -> Result<Vec<Landmark>, LandmarkError> {
        self.client.search(catalog, keyword).await
    }
}

/// Entry point for all landmark lookups.
pub struct QueryService {
    cache: Arc<LandmarkCache>,
}

impl QueryService {
    pub fn new(cache: Arc<LandmarkCache>) -> Self {
        Self { cache }
    }

    fn backend<'a>(
        &'a self,
        source: &'a DataSource,
    ) -> Result<Box<dyn LandmarkBackend + 'a>, LandmarkError> {
        match source.mode {
            SourceMode::Json => Ok(Box::new(JsonBackend {
                cache: &self.cache,
                source,
            })),
            SourceMode::Api => {
                let base_url = source.api_base_url.as_deref().ok_or_else(|| {
                    LandmarkError::Config(format!(
                        "source '{}' is in api mode but has no api_base_url",
                        source.name
                    ))
                })?;
                Ok(Box::new(ApiBackend {
                    client: ApiClient::new(base_url),
                }))
            }
        }
    }

    /// Exact-id lookup against the given source.
    pub async fn by_id(
        &self,
        source: &DataSource,
        catalog: Catalog,
        id: &str,
    ) -> Result<Vec<Landmark>, LandmarkError> {
        self.backend(source)?.by_id(catalog, id).await
    }

    /// Two-step name lookup: exact substring on the origin-script name
    /// first; phonetic-key substring only when that found nothing and the
    /// keyword is purely ASCII-alphabetic. The two steps can never overlap.
    pub async fn by_name_or_phonetic(
        &self,
        source: &DataSource,
        catalog: Catalog,
        keyword: &str,
    ) -> Result<Vec<Landmark>, LandmarkError> {
        self.backend(source)?
            .by_name_or_phonetic(catalog, keyword)
            .await
    }

    /// Route a free-form query. Purely numeric input is tried both as an id
    /// and as a name keyword, concurrently, with id matches listed first and
    /// duplicates (by id, first seen wins) dropped. Anything else goes
    /// straight to the name lookup.
    pub async fn smart_query(
        &self,
        source: &DataSource,
        catalog: Catalog,
        query: &str,
    ) -> Result<Vec<Landmark>, LandmarkError> {
        if !is_numeric(query) {
            return self.by_name_or_phonetic(source, catalog, query).await;
        }

        let backend = self.backend(source)?;
        // Dispatch both legs, then join; merging never races completion.
        let (id_result, name_result) = tokio::join!(
            backend.by_id(catalog, query),
            backend.by_name_or_phonetic(catalog, query)
        );

        Ok(merge_by_id(id_result?, name_result?))
    }
}

fn is_numeric(query: &str) -> bool {
    !query.is_empty() && query.chars().all(|c| c.is_ascii_digit())
}

fn is_ascii_alphabetic(keyword: &str) -> bool {
    !keyword.is_empty() && keyword.chars().all(|c| c.is_ascii_alphabetic())
}

/// Merge two result lists, keeping only the first occurrence of each id and
/// preserving order of first appearance.
fn merge_by_id(primary: Vec<Landmark>, secondary: Vec<Landmark>) -> Vec<Landmark> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(primary.len() + secondary.len());
    for landmark in primary.into_iter().chain(secondary) {
        if seen.insert(landmark.id.clone()) {
            merged.push(landmark);
        }
    }
    merged
}
