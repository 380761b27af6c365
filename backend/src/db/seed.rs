//! Bundled operational dataset used to seed the local repository.
//!
//! Snapshots, alerts, feedback, sentiment, tickets and rosters come from
//! `data/seed.json`. The disease-case table is generated: two years of weekly
//! counts per ward and disease with a yearly season, a slow trend and a fixed
//! jitter pattern, so forecasts over it are reproducible.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fs;
use std::path::Path;

use super::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::api::{
    Alert, CaseRecord, DistrictOperationalSnapshot, FeedbackItem, SentimentData, ServiceTicket,
    WorkforceRoster,
};

const BUNDLED_SEED: &str = include_str!("../../data/seed.json");

pub const SEED_WARDS: [&str; 4] = ["W01", "W02", "W03", "W04"];
pub const SEED_DISEASES: [&str; 3] = ["Dengue", "Malaria", "Typhoid"];
pub const SEED_WEEKS: usize = 104;

/// Everything the local repository starts with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub snapshots: Vec<DistrictOperationalSnapshot>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub feedback: Vec<FeedbackItem>,
    #[serde(default)]
    pub sentiment: SentimentData,
    #[serde(default)]
    pub tickets: Vec<ServiceTicket>,
    #[serde(default)]
    pub workforce: Vec<WorkforceRoster>,
    #[serde(default)]
    pub case_records: Vec<CaseRecord>,
}

impl SeedData {
    /// Parse a seed document. Missing sections are empty.
    pub fn from_json_str(content: &str) -> RepositoryResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read a seed document from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RepositoryError::seed_with_context(
                format!("Failed to read seed file: {}", e),
                ErrorContext::new("load_seed").with_entity_id(path.display()),
            )
        })?;
        let mut seed = Self::from_json_str(&content)?;
        if seed.case_records.is_empty() {
            seed.case_records = synthetic_case_records();
        }
        Ok(seed)
    }

    /// The dataset compiled into the binary, with the generated case table.
    pub fn bundled() -> RepositoryResult<Self> {
        let mut seed = Self::from_json_str(BUNDLED_SEED)?;
        seed.case_records = synthetic_case_records();
        Ok(seed)
    }
}

fn seed_start() -> NaiveDate {
    // 2022-01-03 is a Monday; the fallback is never taken.
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap_or_default()
}

/// Weekly case counts for every seeded ward/disease pair.
pub fn synthetic_case_records() -> Vec<CaseRecord> {
    let start = seed_start();
    let mut records = Vec::with_capacity(SEED_WARDS.len() * SEED_DISEASES.len() * SEED_WEEKS);

    for (w, ward) in SEED_WARDS.iter().enumerate() {
        for (d, disease) in SEED_DISEASES.iter().enumerate() {
            let base = 20.0 + 12.0 * d as f64 + 6.0 * w as f64;
            let amplitude = base * 0.45;
            let phase = (w * 5 + d * 9) as f64;
            let trend = 0.04 * (w as f64 - 1.0);

            for week in 0..SEED_WEEKS {
                let t = week as f64;
                let season = amplitude * (TAU * (t + phase) / 52.0).sin();
                let jitter = ((week * 37 + w * 11 + d * 7) % 9) as f64 - 4.0;
                let value = (base + season + trend * t + jitter).round().max(0.0);
                let date = start + Duration::days(7 * week as i64);
                records.push(with_weather(
                    CaseRecord::new(*ward, *disease, date, value),
                    w,
                    week,
                ));
            }
        }
    }
    records
}

/// Ward-level weather and bed counts for one week.
///
/// Rainfall peaks with the monsoon (late June onwards); the bed total is a
/// fixed per-ward figure.
fn with_weather(record: CaseRecord, ward: usize, week: usize) -> CaseRecord {
    let t = week as f64;
    let monsoon = (TAU * (t - 24.0) / 52.0).sin();
    let wiggle = ((week * 13 + ward * 5) % 7) as f64 - 3.0;
    let total_beds = 180.0 + 40.0 * ward as f64;
    let occupied = (total_beds * 0.6 + record.new_cases * 0.8).min(total_beds).round();

    record
        .with_regressor("rainfall_mm", (90.0 * monsoon + 40.0 + 4.0 * wiggle).max(0.0).round())
        .with_regressor("humidity", (68.0 + 18.0 * monsoon + wiggle).round())
        .with_regressor("temperature", (29.0 - 3.5 * monsoon + 0.5 * wiggle).round())
        .with_regressor("available_beds", total_beds - occupied)
        .with_regressor("total_beds", total_beds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_seed_parses() {
        let seed = SeedData::bundled().unwrap();
        assert_eq!(seed.snapshots.len(), 5);
        assert_eq!(seed.alerts.len(), 6);
        assert_eq!(seed.feedback.len(), 5);
        assert_eq!(seed.sentiment.sentiment_distribution.positive, 45);
        assert_eq!(seed.sentiment.word_frequency.len(), 30);
        assert_eq!(seed.tickets.len(), 14);
        assert_eq!(seed.workforce.len(), 25);
        assert_eq!(seed.case_records.len(), 4 * 3 * SEED_WEEKS);
    }

    #[test]
    fn test_synthetic_cases_are_deterministic_and_weekly() {
        let a = synthetic_case_records();
        let b = synthetic_case_records();
        assert_eq!(a, b);

        let dengue: Vec<&CaseRecord> = a.iter().filter(|r| r.unique_id == "W01__Dengue").collect();
        assert_eq!(dengue.len(), SEED_WEEKS);
        assert_eq!(dengue[0].date, seed_start());
        for pair in dengue.windows(2) {
            assert_eq!((pair[1].date - pair[0].date).num_days(), 7);
        }
        assert!(a.iter().all(|r| r.new_cases >= 0.0));
        assert!(a.iter().all(|r| r.regressor("rainfall_mm").is_some_and(|v| v >= 0.0)));
        assert!(a
            .iter()
            .all(|r| r.regressor("available_beds").is_some_and(|v| v >= 0.0)));
    }

    #[test]
    fn test_partial_seed_document() {
        let seed = SeedData::from_json_str(r#"{ "alerts": [] }"#).unwrap();
        assert!(seed.snapshots.is_empty());
        assert!(seed.case_records.is_empty());
    }

    #[test]
    fn test_malformed_seed_is_reported() {
        let err = SeedData::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, RepositoryError::SeedError { .. }));
    }
}
