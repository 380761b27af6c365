//! All-district ranking and pairwise comparison built on the metric engine.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::api::{
    AllDistrictMetrics, CompareData, DistrictOperationalSnapshot, MetricDifference, MetricKind,
    MetricResult, RankedDistrict,
};
use crate::services::metrics::MetricEngine;

/// Failure confined to a single district of a batch or request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    #[error("Unknown district: {0}")]
    UnknownDistrict(String),

    #[error("Duplicate snapshot for district: {0}")]
    DuplicateDistrict(String),

    #[error("Snapshot has an empty district name")]
    EmptyDistrictName,
}

/// Result of computing one district inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictOutcome {
    pub district: String,
    pub result: Result<MetricResult, AggregationError>,
}

impl DistrictOutcome {
    fn p_score(&self) -> Option<f64> {
        self.result.as_ref().ok().and_then(|m| m.p_score.value())
    }

    /// 0 = scored, 1 = P-Score unavailable, 2 = failed.
    fn rank_class(&self) -> u8 {
        match &self.result {
            Ok(m) if m.p_score.is_available() => 0,
            Ok(_) => 1,
            Err(_) => 2,
        }
    }
}

fn compare_outcomes(a: &DistrictOutcome, b: &DistrictOutcome) -> Ordering {
    a.rank_class()
        .cmp(&b.rank_class())
        .then_with(|| match (a.p_score(), b.p_score()) {
            (Some(pa), Some(pb)) => pb.total_cmp(&pa),
            _ => Ordering::Equal,
        })
        .then_with(|| a.district.cmp(&b.district))
}

/// Compute metrics for every snapshot and rank them.
///
/// Order: P-Score descending with ties by district ascending, then districts
/// whose P-Score is unavailable, then failed entries. A bad entry never
/// aborts the batch.
pub fn compute_all(
    engine: &MetricEngine,
    snapshots: &[DistrictOperationalSnapshot],
) -> Vec<DistrictOutcome> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut outcomes: Vec<DistrictOutcome> = snapshots
        .iter()
        .map(|snapshot| {
            let district = snapshot.district.trim().to_string();
            let result = if district.is_empty() {
                Err(AggregationError::EmptyDistrictName)
            } else if !seen.insert(district.to_lowercase()) {
                Err(AggregationError::DuplicateDistrict(district.clone()))
            } else {
                Ok(engine.compute_metrics(snapshot))
            };
            if let Err(e) = &result {
                log::warn!("Skipping district in batch: {}", e);
            }
            DistrictOutcome { district, result }
        })
        .collect();

    outcomes.sort_by(compare_outcomes);
    outcomes
}

/// Serializable view of a ranked batch.
pub fn ranking_view(outcomes: Vec<DistrictOutcome>) -> AllDistrictMetrics {
    let total = outcomes.len();
    let mut failed = 0;
    let districts = outcomes
        .into_iter()
        .map(|outcome| match outcome.result {
            Ok(metrics) => RankedDistrict {
                district: outcome.district,
                metrics: Some(metrics),
                error: None,
            },
            Err(e) => {
                failed += 1;
                RankedDistrict {
                    district: outcome.district,
                    metrics: None,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect();

    AllDistrictMetrics {
        districts,
        total,
        failed,
    }
}

/// Signed differences `a - b` whose magnitude exceeds `epsilon`.
///
/// Metrics are visited in [`MetricKind::ALL`] order; a metric unavailable on
/// either side is skipped.
pub fn compare(a: &MetricResult, b: &MetricResult, epsilon: f64) -> Vec<MetricDifference> {
    MetricKind::ALL
        .iter()
        .filter_map(|&metric| {
            let va = a.score(metric).value()?;
            let vb = b.score(metric).value()?;
            let difference = va - vb;
            let magnitude = difference.abs();
            if magnitude <= epsilon {
                return None;
            }
            let higher_district = if difference > 0.0 {
                a.district.clone()
            } else {
                b.district.clone()
            };
            Some(MetricDifference {
                metric,
                difference,
                magnitude,
                higher_district,
            })
        })
        .collect()
}

pub fn compare_view(a: &MetricResult, b: &MetricResult, epsilon: f64) -> CompareData {
    CompareData {
        district_a: a.district.clone(),
        district_b: b.district.clone(),
        differences: compare(a, b, epsilon),
    }
}

/// Find a snapshot by district name, ignoring case and surrounding space.
pub fn find_snapshot<'a>(
    snapshots: &'a [DistrictOperationalSnapshot],
    district: &str,
) -> Result<&'a DistrictOperationalSnapshot, AggregationError> {
    let wanted = district.trim();
    snapshots
        .iter()
        .find(|s| s.district.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| AggregationError::UnknownDistrict(wanted.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SnapshotField;
    use proptest::prelude::*;

    /// A snapshot whose P-Score equals `hvi * 0.4` exactly-ish (only HVI
    /// available), scaled through predicted emergency cases.
    fn snapshot_with_hvi(district: &str, hvi: f64) -> DistrictOperationalSnapshot {
        DistrictOperationalSnapshot::new(district)
            .with(SnapshotField::PredictedEmergencyCases, hvi)
            .with(SnapshotField::IcuBeds, 1.0)
            .with(SnapshotField::BedOccupancyRate, 1.0)
            .with(SnapshotField::BedCapacity, 1.0)
    }

    fn names(outcomes: &[DistrictOutcome]) -> Vec<&str> {
        outcomes.iter().map(|o| o.district.as_str()).collect()
    }

    #[test]
    fn test_compute_all_sorts_by_p_score_then_name() {
        let engine = MetricEngine::default();
        let snapshots = vec![
            snapshot_with_hvi("Thane", 3.0),
            snapshot_with_hvi("Pune", 7.0),
            snapshot_with_hvi("Nagpur", 3.0),
            DistrictOperationalSnapshot::new("Jalgaon"),
        ];

        let outcomes = compute_all(&engine, &snapshots);
        assert_eq!(names(&outcomes), vec!["Pune", "Nagpur", "Thane", "Jalgaon"]);
    }

    #[test]
    fn test_compute_all_reports_bad_entries() {
        let engine = MetricEngine::default();
        let snapshots = vec![
            snapshot_with_hvi("Pune", 5.0),
            snapshot_with_hvi("pune", 9.0),
            snapshot_with_hvi("  ", 9.0),
            snapshot_with_hvi("Thane", 2.0),
        ];

        let outcomes = compute_all(&engine, &snapshots);
        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[0].district, "Pune");
        assert_eq!(outcomes[1].district, "Thane");
        assert!(outcomes[2..].iter().all(|o| o.result.is_err()));
        assert!(outcomes
            .iter()
            .any(|o| o.result == Err(AggregationError::DuplicateDistrict("pune".to_string()))));
        assert!(outcomes
            .iter()
            .any(|o| o.result == Err(AggregationError::EmptyDistrictName)));

        let view = ranking_view(outcomes);
        assert_eq!(view.total, 4);
        assert_eq!(view.failed, 2);
    }

    #[test]
    fn test_compare_filters_small_differences() {
        let engine = MetricEngine::default();
        let a = engine.compute_metrics(&snapshot_with_hvi("Pune", 5.0));
        let b = engine.compute_metrics(&snapshot_with_hvi("Thane", 4.95));
        assert!(compare(&a, &b, 0.1).is_empty());

        let c = engine.compute_metrics(&snapshot_with_hvi("Nagpur", 2.0));
        let diffs = compare(&a, &c, 0.1);
        let metrics: Vec<MetricKind> = diffs.iter().map(|d| d.metric).collect();
        assert_eq!(metrics, vec![MetricKind::PScore, MetricKind::Hvi]);
        assert!((diffs[1].difference - 3.0).abs() < 1e-12);
        assert_eq!(diffs[1].higher_district, "Pune");

        let reversed = compare(&c, &a, 0.1);
        assert!(reversed[1].difference < 0.0);
        assert_eq!(reversed[1].higher_district, "Pune");
    }

    #[test]
    fn test_compare_skips_unavailable_metrics() {
        let engine = MetricEngine::default();
        let a = engine.compute_metrics(&snapshot_with_hvi("Pune", 5.0));
        let b = engine.compute_metrics(&DistrictOperationalSnapshot::new("Empty"));
        assert!(compare(&a, &b, 0.1).is_empty());
    }

    #[test]
    fn test_find_snapshot_is_case_insensitive() {
        let snapshots = vec![snapshot_with_hvi("Pune", 1.0)];
        assert!(find_snapshot(&snapshots, " pune ").is_ok());
        assert_eq!(
            find_snapshot(&snapshots, "Goa"),
            Err(AggregationError::UnknownDistrict("Goa".to_string()))
        );
    }

    proptest! {
        #[test]
        fn prop_compute_all_is_sorted(hvis in proptest::collection::vec(0.0f64..12.0, 1..12)) {
            let engine = MetricEngine::default();
            let snapshots: Vec<_> = hvis
                .iter()
                .enumerate()
                .map(|(i, h)| snapshot_with_hvi(&format!("D{:02}", i), *h))
                .collect();

            let outcomes = compute_all(&engine, &snapshots);
            for pair in outcomes.windows(2) {
                let pa = pair[0].p_score().unwrap();
                let pb = pair[1].p_score().unwrap();
                prop_assert!(pa > pb || (pa == pb && pair[0].district < pair[1].district));
            }
        }

        #[test]
        fn prop_compare_respects_epsilon(x in 0.0f64..10.0, y in 0.0f64..10.0) {
            let engine = MetricEngine::default();
            let a = engine.compute_metrics(&snapshot_with_hvi("A", x));
            let b = engine.compute_metrics(&snapshot_with_hvi("B", y));
            let diffs = compare(&a, &b, 0.1);

            for kind in MetricKind::ALL {
                let (Some(va), Some(vb)) = (a.score(kind).value(), b.score(kind).value()) else {
                    continue;
                };
                let listed = diffs.iter().any(|d| d.metric == kind);
                prop_assert_eq!(listed, (va - vb).abs() > 0.1);
            }
        }
    }
}
