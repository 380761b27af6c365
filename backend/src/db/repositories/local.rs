//! In-memory repository for local development and tests.
//!
//! Snapshots live behind a `parking_lot::RwLock` and carry a data version that
//! moves forward whenever their content changes. The other tables are
//! read-only after construction.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::Path;

use crate::api::{
    Alert, CaseRecord, DataVersion, DistrictOperationalSnapshot, FeedbackItem, SentimentData,
    ServiceTicket, WorkforceRoster,
};
use crate::db::checksum::snapshot_checksum;
use crate::db::repository::{
    CaseRepository, DistrictRepository, ErrorContext, OperationsRepository, RepositoryError,
    RepositoryResult, UpsertOutcome, VersionedSnapshot,
};
use crate::db::seed::SeedData;

fn district_key(district: &str) -> String {
    district.trim().to_lowercase()
}

/// Record store held entirely in memory.
pub struct LocalRepository {
    /// Keyed by lower-cased, trimmed district name.
    districts: RwLock<BTreeMap<String, VersionedSnapshot>>,
    cases: Vec<CaseRecord>,
    alerts: Vec<Alert>,
    feedback: Vec<FeedbackItem>,
    sentiment: SentimentData,
    tickets: Vec<ServiceTicket>,
    workforce: Vec<WorkforceRoster>,
}

impl LocalRepository {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            districts: RwLock::new(BTreeMap::new()),
            cases: Vec::new(),
            alerts: Vec::new(),
            feedback: Vec::new(),
            sentiment: SentimentData::default(),
            tickets: Vec::new(),
            workforce: Vec::new(),
        }
    }

    /// A store holding `seed`.
    ///
    /// Every seeded snapshot starts at data version 1. A seed naming the same
    /// district twice is rejected.
    pub fn with_seed(seed: SeedData) -> RepositoryResult<Self> {
        let mut districts = BTreeMap::new();
        for snapshot in seed.snapshots {
            let key = district_key(&snapshot.district);
            if key.is_empty() {
                return Err(RepositoryError::seed_with_context(
                    "Seed snapshot has an empty district name",
                    ErrorContext::new("load_seed").with_entity("district"),
                ));
            }
            if districts.contains_key(&key) {
                return Err(RepositoryError::seed_with_context(
                    format!("Duplicate seed snapshot for district '{}'", snapshot.district),
                    ErrorContext::new("load_seed")
                        .with_entity("district")
                        .with_entity_id(&snapshot.district),
                ));
            }
            let checksum = snapshot_checksum(&snapshot)?;
            districts.insert(
                key,
                VersionedSnapshot {
                    snapshot,
                    version: DataVersion::new(1),
                    checksum,
                },
            );
        }

        let mut cases = seed.case_records;
        cases.sort_by(|a, b| a.unique_id.cmp(&b.unique_id).then(a.date.cmp(&b.date)));

        log::info!(
            "Local repository seeded: {} districts, {} case records, {} tickets",
            districts.len(),
            cases.len(),
            seed.tickets.len()
        );

        Ok(Self {
            districts: RwLock::new(districts),
            cases,
            alerts: seed.alerts,
            feedback: seed.feedback,
            sentiment: seed.sentiment,
            tickets: seed.tickets,
            workforce: seed.workforce,
        })
    }

    /// A store holding the bundled dataset.
    pub fn seeded() -> RepositoryResult<Self> {
        Self::with_seed(SeedData::bundled()?)
    }

    /// A store holding the dataset in a JSON seed file.
    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        Self::with_seed(SeedData::from_file(path)?)
    }

    fn not_found(operation: &str, district: &str) -> RepositoryError {
        RepositoryError::not_found_with_context(
            format!("District '{}' not found", district.trim()),
            ErrorContext::new(operation)
                .with_entity("district")
                .with_entity_id(district.trim()),
        )
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DistrictRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    async fn list_snapshots(&self) -> RepositoryResult<Vec<DistrictOperationalSnapshot>> {
        Ok(self
            .districts
            .read()
            .values()
            .map(|v| v.snapshot.clone())
            .collect())
    }

    async fn get_snapshot(&self, district: &str) -> RepositoryResult<VersionedSnapshot> {
        self.districts
            .read()
            .get(&district_key(district))
            .cloned()
            .ok_or_else(|| Self::not_found("get_snapshot", district))
    }

    async fn upsert_snapshot(
        &self,
        mut snapshot: DistrictOperationalSnapshot,
    ) -> RepositoryResult<UpsertOutcome> {
        let key = district_key(&snapshot.district);
        if key.is_empty() {
            return Err(RepositoryError::validation_with_context(
                "District name must not be empty",
                ErrorContext::new("upsert_snapshot").with_entity("district"),
            ));
        }
        snapshot.district = snapshot.district.trim().to_string();

        let mut districts = self.districts.write();
        if let Some(existing) = districts.get(&key) {
            // Keep the stored spelling so lookups stay stable.
            snapshot.district = existing.snapshot.district.clone();
        }
        let checksum = snapshot_checksum(&snapshot)?;

        let (version, changed) = match districts.get(&key) {
            Some(existing) if existing.checksum == checksum => (existing.version, false),
            Some(existing) => (existing.version.next(), true),
            None => (DataVersion::new(1), true),
        };

        let district = snapshot.district.clone();
        if changed {
            districts.insert(
                key,
                VersionedSnapshot {
                    snapshot,
                    version,
                    checksum,
                },
            );
        }

        Ok(UpsertOutcome {
            district,
            version,
            changed,
        })
    }

    async fn data_version(&self, district: &str) -> RepositoryResult<DataVersion> {
        self.districts
            .read()
            .get(&district_key(district))
            .map(|v| v.version)
            .ok_or_else(|| Self::not_found("data_version", district))
    }

    async fn list_districts(&self) -> RepositoryResult<Vec<String>> {
        let mut names: Vec<String> = self
            .districts
            .read()
            .values()
            .map(|v| v.snapshot.district.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl CaseRepository for LocalRepository {
    async fn case_records(&self) -> RepositoryResult<Vec<CaseRecord>> {
        Ok(self.cases.clone())
    }

    async fn series_records(&self, unique_id: &str) -> RepositoryResult<Vec<CaseRecord>> {
        Ok(self
            .cases
            .iter()
            .filter(|r| r.unique_id == unique_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OperationsRepository for LocalRepository {
    async fn alerts(&self) -> RepositoryResult<Vec<Alert>> {
        Ok(self.alerts.clone())
    }

    async fn feedback(&self) -> RepositoryResult<Vec<FeedbackItem>> {
        Ok(self.feedback.clone())
    }

    async fn sentiment(&self) -> RepositoryResult<SentimentData> {
        Ok(self.sentiment.clone())
    }

    async fn tickets(&self) -> RepositoryResult<Vec<ServiceTicket>> {
        Ok(self.tickets.clone())
    }

    async fn workforce_rosters(&self) -> RepositoryResult<Vec<WorkforceRoster>> {
        Ok(self.workforce.clone())
    }
}
