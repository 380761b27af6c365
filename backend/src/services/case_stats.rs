//! Descriptive statistics over the disease-case table.
//!
//! These feed the case dashboard and the series picker of the forecast view.

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::api::{
    CaseRecord, Correlation, CorrelationAnalysis, DateRange, DiseaseDistribution, ForecastSeries,
    OverallStats, SeriesData, TimeTrends, TrendPeriod, WardAnalysis,
};
use crate::models::REGRESSOR_COLUMNS;
use crate::services::stats;
use crate::services::forecast::ForecastError;

pub const DEFAULT_TOP_WARDS: usize = 10;

#[derive(Default)]
struct Totals {
    sum: f64,
    count: usize,
}

impl Totals {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Dataset totals: cases, distinct periods, wards and diseases.
pub fn overall_stats(records: &[CaseRecord]) -> OverallStats {
    let mut per_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut wards = BTreeSet::new();
    let mut diseases = BTreeSet::new();
    for record in records {
        *per_date.entry(record.date).or_insert(0.0) += record.new_cases;
        wards.insert(record.ward_id.as_str());
        diseases.insert(record.disease_type.as_str());
    }

    let total_cases: f64 = per_date.values().sum();
    let total_weeks = per_date.len();
    let date_range = match (per_date.keys().next(), per_date.keys().next_back()) {
        (Some(start), Some(end)) => Some(DateRange {
            start: *start,
            end: *end,
        }),
        _ => None,
    };

    OverallStats {
        total_cases,
        avg_weekly_cases: if total_weeks == 0 {
            0.0
        } else {
            total_cases / total_weeks as f64
        },
        total_weeks,
        unique_wards: wards.len(),
        unique_diseases: diseases.len(),
        date_range,
    }
}

/// Per-disease totals and per-record averages, largest total first.
pub fn disease_distribution(records: &[CaseRecord]) -> DiseaseDistribution {
    let mut by_disease: HashMap<&str, Totals> = HashMap::new();
    for record in records {
        by_disease
            .entry(record.disease_type.as_str())
            .or_default()
            .add(record.new_cases);
    }

    let mut rows: Vec<(&str, Totals)> = by_disease.into_iter().collect();
    rows.sort_by(|a, b| b.1.sum.total_cmp(&a.1.sum).then_with(|| a.0.cmp(b.0)));

    let mut out = DiseaseDistribution::default();
    for (disease, totals) in rows {
        out.diseases.push(disease.to_string());
        out.total_cases.push(totals.sum);
        out.avg_cases.push(totals.mean());
    }
    out
}

/// The `top_n` wards by total cases, with the number of diseases each reports.
pub fn ward_analysis(records: &[CaseRecord], top_n: usize) -> WardAnalysis {
    let mut by_ward: HashMap<&str, (Totals, BTreeSet<&str>)> = HashMap::new();
    for record in records {
        let entry = by_ward.entry(record.ward_id.as_str()).or_default();
        entry.0.add(record.new_cases);
        entry.1.insert(record.disease_type.as_str());
    }

    let mut rows: Vec<_> = by_ward.into_iter().collect();
    rows.sort_by(|a, b| (b.1).0.sum.total_cmp(&(a.1).0.sum).then_with(|| a.0.cmp(b.0)));
    rows.truncate(top_n);

    let mut out = WardAnalysis::default();
    for (ward, (totals, diseases)) in rows {
        out.wards.push(ward.to_string());
        out.total_cases.push(totals.sum);
        out.avg_cases.push(totals.mean());
        out.num_diseases.push(diseases.len());
    }
    out
}

/// Bucket label of a date: ISO week `YYYY-Www` or month `YYYY-MM`.
pub fn period_label(date: NaiveDate, period: TrendPeriod) -> String {
    match period {
        TrendPeriod::Weekly => {
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        TrendPeriod::Monthly => format!("{}-{:02}", date.year(), date.month()),
    }
}

/// Case totals and per-record averages per period, in chronological order.
pub fn time_trends(records: &[CaseRecord], period: TrendPeriod) -> TimeTrends {
    let mut buckets: BTreeMap<String, Totals> = BTreeMap::new();
    for record in records {
        buckets
            .entry(period_label(record.date, period))
            .or_default()
            .add(record.new_cases);
    }

    let mut trends = TimeTrends {
        period,
        periods: Vec::with_capacity(buckets.len()),
        total_cases: Vec::with_capacity(buckets.len()),
        avg_cases: Vec::with_capacity(buckets.len()),
    };
    for (label, totals) in buckets {
        trends.periods.push(label);
        trends.total_cases.push(totals.sum);
        trends.avg_cases.push(totals.mean());
    }
    trends
}

/// Pearson correlation of `new_cases` with each exogenous column.
///
/// Each coefficient uses the records that carry that column. Columns that are
/// constant or too sparse to correlate are listed as available but get no
/// coefficient.
pub fn correlation_analysis(records: &[CaseRecord]) -> CorrelationAnalysis {
    let present: Vec<&str> = REGRESSOR_COLUMNS
        .iter()
        .copied()
        .filter(|col| records.iter().any(|r| r.regressors.contains_key(*col)))
        .collect();
    if present.is_empty() || records.is_empty() {
        return CorrelationAnalysis::default();
    }

    let mut correlations: Vec<Correlation> = present
        .iter()
        .filter_map(|col| {
            let pairs: Vec<(f64, f64)> = records
                .iter()
                .filter_map(|r| r.regressor(col).map(|v| (r.new_cases, v)))
                .filter(|(cases, v)| cases.is_finite() && v.is_finite())
                .collect();
            stats::pearson(&pairs).map(|coefficient| Correlation {
                variable: col.to_string(),
                coefficient,
            })
        })
        .collect();
    correlations.sort_by(|a, b| {
        b.coefficient
            .abs()
            .partial_cmp(&a.coefficient.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut available_vars = vec!["new_cases".to_string()];
    available_vars.extend(present.iter().map(|c| c.to_string()));
    CorrelationAnalysis {
        correlations,
        available_vars,
    }
}

/// Sorted, distinct series ids.
pub fn list_series(records: &[CaseRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.unique_id.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Build a forecast series from the case table.
pub fn series(records: &[CaseRecord], unique_id: &str) -> Result<ForecastSeries, ForecastError> {
    ForecastSeries::from_records(unique_id, records)
        .ok_or_else(|| ForecastError::UnknownSeries(unique_id.to_string()))
}

/// The last `n` observations of a series (all of them when `n` is `None`).
pub fn series_data(
    records: &[CaseRecord],
    unique_id: &str,
    n: Option<usize>,
) -> Result<SeriesData, ForecastError> {
    let series = series(records, unique_id)?;
    let skip = n.map_or(0, |n| series.len().saturating_sub(n));
    Ok(SeriesData {
        unique_id: series.unique_id,
        data: series.points.into_iter().skip(skip).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn records() -> Vec<CaseRecord> {
        vec![
            CaseRecord::new("W1", "Dengue", date(2024, 1, 1), 10.0),
            CaseRecord::new("W1", "Malaria", date(2024, 1, 1), 4.0),
            CaseRecord::new("W2", "Dengue", date(2024, 1, 8), 6.0),
            CaseRecord::new("W1", "Dengue", date(2024, 1, 8), 2.0),
            CaseRecord::new("W3", "Typhoid", date(2024, 2, 5), 1.0),
        ]
    }

    #[test]
    fn test_overall_stats() {
        let stats = overall_stats(&records());
        assert_eq!(stats.total_cases, 23.0);
        assert_eq!(stats.total_weeks, 3);
        assert!((stats.avg_weekly_cases - 23.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.unique_wards, 3);
        assert_eq!(stats.unique_diseases, 3);
        assert_eq!(
            stats.date_range,
            Some(DateRange {
                start: date(2024, 1, 1),
                end: date(2024, 2, 5)
            })
        );
    }

    #[test]
    fn test_overall_stats_empty() {
        let stats = overall_stats(&[]);
        assert_eq!(stats.total_weeks, 0);
        assert_eq!(stats.avg_weekly_cases, 0.0);
        assert_eq!(stats.date_range, None);
    }

    #[test]
    fn test_disease_distribution_largest_first() {
        let dist = disease_distribution(&records());
        assert_eq!(dist.diseases, vec!["Dengue", "Malaria", "Typhoid"]);
        assert_eq!(dist.total_cases, vec![18.0, 4.0, 1.0]);
        assert_eq!(dist.avg_cases[0], 6.0);
    }

    #[test]
    fn test_ward_analysis_top_n() {
        let wards = ward_analysis(&records(), 2);
        assert_eq!(wards.wards, vec!["W1", "W2"]);
        assert_eq!(wards.total_cases, vec![16.0, 6.0]);
        assert_eq!(wards.num_diseases, vec![2, 1]);
    }

    #[test]
    fn test_time_trends_weekly_and_monthly() {
        let weekly = time_trends(&records(), TrendPeriod::Weekly);
        assert_eq!(weekly.periods, vec!["2024-W01", "2024-W02", "2024-W06"]);
        assert_eq!(weekly.total_cases, vec![14.0, 8.0, 1.0]);

        let monthly = time_trends(&records(), TrendPeriod::Monthly);
        assert_eq!(monthly.periods, vec!["2024-01", "2024-02"]);
        assert_eq!(monthly.total_cases, vec![22.0, 1.0]);
    }

    #[test]
    fn test_iso_week_crosses_year_boundary() {
        assert_eq!(
            period_label(date(2021, 1, 1), TrendPeriod::Weekly),
            "2020-W53"
        );
    }

    #[test]
    fn test_correlation_analysis_orders_by_strength() {
        let records: Vec<CaseRecord> = (0..6)
            .map(|i| {
                let cases = 10.0 + i as f64;
                CaseRecord::new("W1", "Dengue", date(2024, 1, 1 + i), cases)
                    .with_regressor("rainfall_mm", 3.0 * cases + if i % 2 == 0 { 4.0 } else { 0.0 })
                    .with_regressor("temperature", 40.0 - cases)
                    .with_regressor("total_beds", 200.0)
            })
            .collect();

        let analysis = correlation_analysis(&records);
        assert_eq!(
            analysis.available_vars,
            vec!["new_cases", "rainfall_mm", "temperature", "total_beds"]
        );
        let vars: Vec<&str> = analysis
            .correlations
            .iter()
            .map(|c| c.variable.as_str())
            .collect();
        // Constant bed totals have no coefficient.
        assert_eq!(vars, vec!["temperature", "rainfall_mm"]);
        assert!((analysis.correlations[0].coefficient + 1.0).abs() < 1e-12);
        assert!(analysis.correlations[1].coefficient > 0.0);
        assert!(analysis.correlations[1].coefficient < 1.0);
    }

    #[test]
    fn test_correlation_analysis_without_regressors() {
        let analysis = correlation_analysis(&records());
        assert!(analysis.correlations.is_empty());
        assert!(analysis.available_vars.is_empty());
    }

    #[test]
    fn test_series_listing_and_data() {
        let records = records();
        assert_eq!(
            list_series(&records),
            vec!["W1__Dengue", "W1__Malaria", "W2__Dengue", "W3__Typhoid"]
        );

        let data = series_data(&records, "W1__Dengue", Some(1)).unwrap();
        assert_eq!(data.data.len(), 1);
        assert_eq!(data.data[0].value, 2.0);

        let all = series_data(&records, "W1__Dengue", None).unwrap();
        assert_eq!(all.data.len(), 2);

        assert_eq!(
            series_data(&records, "W9__Cholera", None),
            Err(ForecastError::UnknownSeries("W9__Cholera".to_string()))
        );
    }
}
