//! Repository traits for the record store.
//!
//! The store is split by concern, the same way the metric and dashboard
//! services consume it:
//!
//! - [`DistrictRepository`]: versioned district snapshots (metric engine input)
//! - [`CaseRepository`]: the disease-case table (forecast input)
//! - [`OperationsRepository`]: alerts, feedback, sentiment, tickets, rosters
//!
//! [`FullRepository`] bundles all three and is what the application holds.

pub mod error;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{
    Alert, CaseRecord, DataVersion, DistrictOperationalSnapshot, FeedbackItem, SentimentData,
    ServiceTicket, WorkforceRoster,
};

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// A stored snapshot with its version and content fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedSnapshot {
    pub snapshot: DistrictOperationalSnapshot,
    pub version: DataVersion,
    /// SHA-256 of the snapshot's JSON form.
    pub checksum: String,
}

/// Outcome of storing a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    pub district: String,
    pub version: DataVersion,
    /// False when the stored snapshot was already identical.
    pub changed: bool,
}

/// Repository trait for district snapshots.
///
/// District names are matched case-insensitively and ignoring surrounding
/// whitespace; the stored spelling is the one returned.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait DistrictRepository: Send + Sync {
    /// Check that the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Every stored snapshot, ordered by district name.
    async fn list_snapshots(&self) -> RepositoryResult<Vec<DistrictOperationalSnapshot>>;

    /// Fetch one district's snapshot.
    ///
    /// # Returns
    /// * `Ok(VersionedSnapshot)` - The snapshot and its data version
    /// * `Err(RepositoryError::NotFound)` - If the district is unknown
    async fn get_snapshot(&self, district: &str) -> RepositoryResult<VersionedSnapshot>;

    /// Insert or replace a district's snapshot.
    ///
    /// The data version is bumped only when the content changes, so callers
    /// can use it as a cache key.
    async fn upsert_snapshot(
        &self,
        snapshot: DistrictOperationalSnapshot,
    ) -> RepositoryResult<UpsertOutcome>;

    /// Current data version of a district.
    async fn data_version(&self, district: &str) -> RepositoryResult<DataVersion>;

    /// Stored district names, sorted.
    async fn list_districts(&self) -> RepositoryResult<Vec<String>>;
}

/// Repository trait for the disease-case table.
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// All case records, ordered by series and date.
    async fn case_records(&self) -> RepositoryResult<Vec<CaseRecord>>;

    /// Records of one series (`"<ward>__<disease>"`), ascending by date.
    ///
    /// An unknown series yields an empty list.
    async fn series_records(&self, unique_id: &str) -> RepositoryResult<Vec<CaseRecord>>;
}

/// Repository trait for the operational dashboard records.
#[async_trait]
pub trait OperationsRepository: Send + Sync {
    async fn alerts(&self) -> RepositoryResult<Vec<Alert>>;

    async fn feedback(&self) -> RepositoryResult<Vec<FeedbackItem>>;

    async fn sentiment(&self) -> RepositoryResult<SentimentData>;

    async fn tickets(&self) -> RepositoryResult<Vec<ServiceTicket>>;

    async fn workforce_rosters(&self) -> RepositoryResult<Vec<WorkforceRoster>>;
}

/// Everything the application needs from the record store.
pub trait FullRepository: DistrictRepository + CaseRepository + OperationsRepository {}

impl<T> FullRepository for T where T: DistrictRepository + CaseRepository + OperationsRepository {}
