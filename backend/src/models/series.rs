//! Disease-case records and the time series built from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One weekly disease-case observation for a ward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Series key, `"<ward>__<disease>"`.
    pub unique_id: String,
    pub ward_id: String,
    pub disease_type: String,
    pub date: NaiveDate,
    pub new_cases: f64,
    /// Exogenous observations for the same week, keyed by column name
    /// (see [`REGRESSOR_COLUMNS`]). Any subset may be present.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub regressors: BTreeMap<String, f64>,
}

/// Exogenous columns a case table may carry, in reporting order.
pub const REGRESSOR_COLUMNS: &[&str] = &[
    "rainfall_mm",
    "humidity",
    "temperature",
    "available_beds",
    "occupied_beds",
    "total_beds",
    "vacancy_rate",
    "lab_capacity",
    "public_reporting_rate",
    "private_reporting_rate",
    "private_ari_reports",
    "private_fever_reports",
    "antimalarial_sales",
    "rifampicin_sales",
    "taluka_antimalarial_sales",
    "taluka_rifampicin_sales",
    "mobility_index",
    "pharma_scale",
];

impl CaseRecord {
    pub fn new(
        ward_id: impl Into<String>,
        disease_type: impl Into<String>,
        date: NaiveDate,
        new_cases: f64,
    ) -> Self {
        let ward_id = ward_id.into();
        let disease_type = disease_type.into();
        Self {
            unique_id: series_key(&ward_id, &disease_type),
            ward_id,
            disease_type,
            date,
            new_cases,
            regressors: BTreeMap::new(),
        }
    }

    pub fn with_regressor(mut self, column: impl Into<String>, value: f64) -> Self {
        self.regressors.insert(column.into(), value);
        self
    }

    pub fn regressor(&self, column: &str) -> Option<f64> {
        self.regressors.get(column).copied()
    }
}

/// Build the series key for a ward/disease pair.
pub fn series_key(ward_id: &str, disease_type: &str) -> String {
    format!("{}__{}", ward_id, disease_type)
}

/// A single (date, value) observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// A named historical time series, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub unique_id: String,
    pub points: Vec<SeriesPoint>,
}

impl ForecastSeries {
    pub fn new(unique_id: impl Into<String>, points: Vec<SeriesPoint>) -> Self {
        Self {
            unique_id: unique_id.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Split into (train, test) with the last `k` points held out.
    pub fn split_tail(&self, k: usize) -> (ForecastSeries, Vec<SeriesPoint>) {
        let cut = self.points.len().saturating_sub(k);
        let train = ForecastSeries::new(self.unique_id.clone(), self.points[..cut].to_vec());
        (train, self.points[cut..].to_vec())
    }

    /// Group case records into per-series observations, sorted by date.
    ///
    /// Records sharing a date within one series are summed.
    pub fn from_records(unique_id: &str, records: &[CaseRecord]) -> Option<Self> {
        let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for record in records.iter().filter(|r| r.unique_id == unique_id) {
            *by_date.entry(record.date).or_insert(0.0) += record.new_cases;
        }
        if by_date.is_empty() {
            return None;
        }
        let points = by_date
            .into_iter()
            .map(|(date, value)| SeriesPoint::new(date, value))
            .collect();
        Some(Self::new(unique_id, points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_case_record_builds_series_key() {
        let record = CaseRecord::new("Ward_001", "Dengue", date(2024, 1, 1), 5.0);
        assert_eq!(record.unique_id, "Ward_001__Dengue");
    }

    #[test]
    fn test_from_records_sorts_and_sums() {
        let records = vec![
            CaseRecord::new("W1", "Malaria", date(2024, 1, 15), 3.0),
            CaseRecord::new("W1", "Malaria", date(2024, 1, 1), 1.0),
            CaseRecord::new("W1", "Malaria", date(2024, 1, 1), 2.0),
            CaseRecord::new("W2", "Malaria", date(2024, 1, 8), 9.0),
        ];

        let series = ForecastSeries::from_records("W1__Malaria", &records).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.points[0], SeriesPoint::new(date(2024, 1, 1), 3.0));
        assert_eq!(series.points[1], SeriesPoint::new(date(2024, 1, 15), 3.0));
    }

    #[test]
    fn test_from_records_unknown_series() {
        assert!(ForecastSeries::from_records("nope", &[]).is_none());
    }

    #[test]
    fn test_split_tail() {
        let points = (0..5)
            .map(|i| SeriesPoint::new(date(2024, 1, 1 + i), i as f64))
            .collect();
        let series = ForecastSeries::new("s", points);

        let (train, test) = series.split_tail(2);
        assert_eq!(train.len(), 3);
        assert_eq!(test.len(), 2);
        assert_eq!(test[0].value, 3.0);
    }
}
