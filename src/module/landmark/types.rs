//! Shared data types for landmark resolution
//!
//! These types are the normalized shapes both backends (JSON snapshot and
//! remote API) must produce, plus the error taxonomy every component boundary
//! converts into.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Base URL for the community wiki; landmark names are appended verbatim.
pub const WIKI_BASE_URL: &str = "https://wiki.ria.red/wiki/";

/// One of the two fixed record groups a query is routed to.
///
/// The variant name doubles as the snapshot key and the API path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Catalog {
    Zeroth,
    Houtu,
}

impl Catalog {
    pub const ALL: [Catalog; 2] = [Catalog::Zeroth, Catalog::Houtu];

    /// Snapshot key / API path segment for this catalog.
    pub fn key(&self) -> &'static str {
        match self {
            Catalog::Zeroth => "zeroth",
            Catalog::Houtu => "houtu",
        }
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// In-world position of a landmark. Y is optional because many entries only
/// record the horizontal position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    #[serde(default)]
    pub y: Option<f64>,
    pub z: f64,
}

/// Normalized landmark record, constructed fresh on every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: String,
    pub name: String,
    pub level: String,
    pub coordinates: Option<Coordinates>,
    pub status: String,
}

impl Landmark {
    /// Wiki page URL for this landmark; the presentation layer turns this
    /// into a clickable link.
    pub fn wiki_url(&self) -> String {
        format!("{}{}", WIKI_BASE_URL, self.name)
    }
}

/// Raw snapshot row as it appears in the JSON document. The document calls
/// the classification label `grade`; the normalized record calls it `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotRecord {
    pub id: String,
    pub name: String,
    pub grade: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub status: Option<String>,
}

impl From<SnapshotRecord> for Landmark {
    fn from(record: SnapshotRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            level: record.grade,
            coordinates: record.coordinates,
            status: record.status.unwrap_or_else(|| "Normal".to_string()),
        }
    }
}

/// Top-level snapshot document shape, shared by the cache file and the
/// remote JSON endpoints.
///
/// Catalog arrays stay as raw values so one malformed row can be skipped
/// without rejecting the whole document; a missing catalog key is still
/// distinguishable from an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub zeroth: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub houtu: Option<Vec<serde_json::Value>>,
}

impl Snapshot {
    /// Raw rows for one catalog, or `None` when the key is absent.
    pub fn catalog(&self, catalog: Catalog) -> Option<&[serde_json::Value]> {
        match catalog {
            Catalog::Zeroth => self.zeroth.as_deref(),
            Catalog::Houtu => self.houtu.as_deref(),
        }
    }
}

/// Parse raw rows into normalized records, skipping rows that do not parse
/// completely. A record is either fully populated or excluded.
pub(crate) fn landmarks_from_rows(rows: &[serde_json::Value]) -> Vec<Landmark> {
    rows.iter()
        .filter_map(|row| match serde_json::from_value::<SnapshotRecord>(row.clone()) {
            Ok(record) => Some(record.into()),
            Err(e) => {
                tracing::debug!("Skipping malformed landmark record: {}", e);
                None
            }
        })
        .collect()
}

/// Probe result for a single snapshot URL. Constructed fresh per probe,
/// never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorStatus {
    pub url: String,
    pub is_primary: bool,
    pub is_available: bool,
    pub version: Option<String>,
    pub status_text: String,
}

/// Liveness report for an API-mode source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub text: String,
    pub reachable: bool,
    pub latency: Option<Duration>,
}

/// Error taxonomy surfaced across the presentation boundary. All low-level
/// I/O failures are converted into one of these at component boundaries.
#[derive(Debug, Error)]
pub enum LandmarkError {
    /// Registry load/reload failure; previous state is retained.
    #[error("invalid source configuration: {0}")]
    Config(String),

    /// Cache missing or corrupt with no reachable source to rebuild it,
    /// legacy fallback included.
    #[error("landmark data unavailable: {0}")]
    DataUnavailable(String),

    /// Network or parse failure talking to a remote API.
    #[error("remote query failed: {0}")]
    RemoteQueryFailed(String),

    /// Every primary and mirror URL failed during an update attempt; the
    /// stale cache is retained and still served.
    #[error("sync failed, all source URLs exhausted: {0}")]
    SyncFailed(String),
}
