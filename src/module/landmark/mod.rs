//! Landmark data source resolution and synchronization
//!
//! Resolves and searches structured landmark records across two catalogs
//! (`zeroth`, `houtu`) served by interchangeable data sources: a local JSON
//! snapshot kept fresh against remote mirrors, or a remote query API.
//!
//! ## Main components
//! - `SourceRegistry` / `SourceSelector`: configured sources and the
//!   process-wide "current source" pointer
//! - `LandmarkCache`: per-source on-disk snapshots with mirror failover and
//!   a legacy shared-file fallback
//! - `QueryService`: one query contract over both backends
//! - `check_all_mirrors` / `check_source_status`: liveness reporting

// ============ Core Data Structures ============
mod types;
pub use types::{
    Catalog, Coordinates, Landmark, LandmarkError, MirrorStatus, Snapshot, SnapshotRecord,
    SourceStatus, WIKI_BASE_URL,
};

// ============ Phonetic Keys ============
mod pinyin;
pub use pinyin::to_phonetic_key;

// ============ Source Configuration ============
mod source;
pub use source::{DataSource, SourceMode, SourceRegistry};

mod selector;
pub use selector::SourceSelector;

// ============ Snapshot Transfer and Cache ============
mod fetch;
pub use fetch::snapshot_client;

mod cache;
pub use cache::{LandmarkCache, SyncOutcome};

// ============ Liveness Probing ============
mod mirror;
pub use mirror::{check_all_mirrors, check_all_mirrors_with_timeout, DEFAULT_PROBE_TIMEOUT};

mod status;
pub use status::check_source_status;

// ============ Query Backends ============
mod api_client;
pub use api_client::ApiClient;

mod query;
pub use query::{LandmarkBackend, QueryService};

// ============ Background Refresh ============
mod updater;
pub use updater::{RefreshReport, SourceUpdater};
