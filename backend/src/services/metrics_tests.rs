use super::*;
use crate::api::ScoreValue;
use crate::config::WeightConfig;
use proptest::prelude::*;

fn full_snapshot(district: &str) -> DistrictOperationalSnapshot {
    DistrictOperationalSnapshot::new(district)
        .with(SnapshotField::PredictedEmergencyCases, 150.0)
        .with(SnapshotField::IcuBeds, 50.0)
        .with(SnapshotField::BedOccupancyRate, 0.9)
        .with(SnapshotField::BedCapacity, 1.0)
        .with(SnapshotField::ServiceRequestVolume, 40.0)
        .with(SnapshotField::InfrastructureCapacity, 10.0)
        .with(SnapshotField::DemandForecast, 1.2)
        .with(SnapshotField::WorkerUtilizationRate, 0.8)
        .with(SnapshotField::AvailableWorkers, 0.1)
        .with(SnapshotField::EscalatedRequests, 30.0)
        .with(SnapshotField::TotalRequests, 100.0)
        .with(SnapshotField::ResolutionTimeLowLiteracy, 12.0)
        .with(SnapshotField::ResolutionTimeHighLiteracy, 8.0)
}

fn value(score: &ScoreValue) -> f64 {
    score.value().expect("score should be available")
}

#[test]
fn test_hvi_worked_example() {
    let snapshot = DistrictOperationalSnapshot::new("Pune")
        .with(SnapshotField::PredictedEmergencyCases, 150.0)
        .with(SnapshotField::IcuBeds, 50.0)
        .with(SnapshotField::BedOccupancyRate, 0.9)
        .with(SnapshotField::BedCapacity, 1.0);

    let result = compute_metrics(&snapshot);
    assert!((value(&result.hvi_score) - 2.7).abs() < 1e-12);
}

#[test]
fn test_sel_worked_example() {
    let snapshot = DistrictOperationalSnapshot::new("Pune")
        .with(SnapshotField::ResolutionTimeLowLiteracy, 12.0)
        .with(SnapshotField::ResolutionTimeHighLiteracy, 8.0);

    let result = compute_metrics(&snapshot);
    assert_eq!(value(&result.sel_index), 1.5);
    assert_eq!(result.sel_priority, Some(PriorityLevel::Critical));
    assert!(result.equity_gap);
    assert!(result
        .all_issues
        .contains(&"Significant equity gap detected (SEL: 1.50)".to_string()));
    assert!(result
        .all_issues
        .contains(&"Resolution time is >50% longer in underserved areas".to_string()));
}

#[test]
fn test_zero_icu_beds_is_unavailable() {
    let snapshot = full_snapshot("Pune").with(SnapshotField::IcuBeds, 0.0);
    let result = compute_metrics(&snapshot);

    assert_eq!(
        result.hvi_score,
        ScoreValue::Unavailable {
            reason: MetricUnavailable::DivisionGuard {
                field: SnapshotField::IcuBeds
            }
        }
    );
    // The gap depends on HVI and goes with it.
    assert_eq!(
        result.health_worker_capacity_gap.reason(),
        Some(&MetricUnavailable::Dependency {
            metric: MetricKind::Hvi
        })
    );
    assert!(result.p_score.is_available());
    assert!(result
        .all_issues
        .contains(&"HVI unavailable: insufficient data: icu_beds is zero".to_string()));
}

#[test]
fn test_missing_and_invalid_inputs_are_missing_data() {
    let mut snapshot = full_snapshot("Pune");
    snapshot.infrastructure_capacity = None;
    snapshot.worker_utilization_rate = Some(f64::NAN);
    snapshot.resolution_time_low_literacy = Some(-3.0);

    let result = compute_metrics(&snapshot);
    assert_eq!(
        result.iss_score.reason(),
        Some(&MetricUnavailable::MissingData {
            field: SnapshotField::InfrastructureCapacity
        })
    );
    assert_eq!(
        result.rcs_score.reason(),
        Some(&MetricUnavailable::MissingData {
            field: SnapshotField::WorkerUtilizationRate
        })
    );
    assert!(!result.sel_index.is_available());
    assert_eq!(result.sel_priority, None);
    assert!(!result.equity_gap);
}

#[test]
fn test_p_score_exact_weighted_sum() {
    let result = compute_metrics(&full_snapshot("Pune"));
    let hvi = value(&result.hvi_score);
    let iss = value(&result.iss_score);
    let rcs = value(&result.rcs_score);

    let expected = (0.4 * hvi + 0.3 * iss + 0.3 * rcs).clamp(0.0, 10.0);
    assert_eq!(value(&result.p_score), expected);
}

#[test]
fn test_p_score_renormalises_missing_component() {
    let mut snapshot = full_snapshot("Pune");
    snapshot.demand_forecast = None;

    let result = compute_metrics(&snapshot);
    assert!(!result.iss_score.is_available());

    let hvi = value(&result.hvi_score);
    let rcs = value(&result.rcs_score);
    let expected = (0.4 * hvi + 0.3 * rcs) / (0.4 + 0.3);
    assert!((value(&result.p_score) - expected).abs() < 1e-12);
    assert!(result
        .explanation
        .iter()
        .any(|line| line.starts_with("ISS: unavailable")));
}

#[test]
fn test_p_score_unavailable_without_components() {
    let result = compute_metrics(&DistrictOperationalSnapshot::new("Empty"));

    assert_eq!(
        result.p_score.reason(),
        Some(&MetricUnavailable::NoComponents)
    );
    assert_eq!(result.priority_level, None);
    assert!(result.component_priorities.is_empty());
    assert!(result.recommendations.is_empty());
    assert_eq!(
        result.all_issues.len(),
        MetricKind::ALL.len(),
        "one unavailable line per metric: {:?}",
        result.all_issues
    );
}

#[test]
fn test_custom_weights_are_normalised() {
    let mut config = AnalyticsConfig::default();
    config.weights = WeightConfig {
        hvi: 2.0,
        iss: 1.0,
        rcs: 1.0,
    };
    let engine = MetricEngine::new(&config);
    let result = engine.compute_metrics(&full_snapshot("Pune"));

    let expected = 0.5 * value(&result.hvi_score)
        + 0.25 * value(&result.iss_score)
        + 0.25 * value(&result.rcs_score);
    assert!((value(&result.p_score) - expected).abs() < 1e-12);
}

#[test]
fn test_priority_levels() {
    let engine = MetricEngine::default();
    assert_eq!(engine.classify(9.0), PriorityLevel::Critical);
    assert_eq!(engine.classify(8.0), PriorityLevel::Critical);
    assert_eq!(engine.classify(6.5), PriorityLevel::High);
    assert_eq!(engine.classify(4.0), PriorityLevel::Medium);
    assert_eq!(engine.classify(3.99), PriorityLevel::Low);
}

#[test]
fn test_sel_priority_boundary() {
    let engine = MetricEngine::default();
    assert_eq!(engine.classify_sel(1.3), PriorityLevel::Critical);
    assert_eq!(engine.classify_sel(1.25), PriorityLevel::High);
    assert_eq!(engine.classify_sel(1.1), PriorityLevel::Low);
    // Exactly 1.2 is HIGH while the equity-gap flag needs strictly more.
    assert_eq!(engine.classify_sel(1.2), PriorityLevel::High);
}

#[test]
fn test_capacity_gap_matches_hvi_without_workers() {
    let snapshot = full_snapshot("Pune").with(SnapshotField::AvailableWorkers, 0.0);
    let result = compute_metrics(&snapshot);

    let gap = value(&result.health_worker_capacity_gap);
    assert!((gap - value(&result.hvi_score)).abs() < 1e-12);
    // RCS divides by available workers and becomes unavailable.
    assert_eq!(
        result.rcs_score.reason(),
        Some(&MetricUnavailable::DivisionGuard {
            field: SnapshotField::AvailableWorkers
        })
    );
}

#[test]
fn test_capacity_gap_halves_at_saturation() {
    let snapshot = full_snapshot("Pune").with(SnapshotField::AvailableWorkers, 25.0);
    let result = compute_metrics(&snapshot);
    let expected = value(&result.hvi_score) / 2.0;
    assert!((value(&result.health_worker_capacity_gap) - expected).abs() < 1e-12);
}

#[test]
fn test_critical_district_recommendations() {
    let snapshot = DistrictOperationalSnapshot::new("Mumbai")
        .with(SnapshotField::PredictedEmergencyCases, 900.0)
        .with(SnapshotField::IcuBeds, 30.0)
        .with(SnapshotField::BedOccupancyRate, 0.95)
        .with(SnapshotField::BedCapacity, 1.0)
        .with(SnapshotField::ServiceRequestVolume, 120.0)
        .with(SnapshotField::InfrastructureCapacity, 10.0)
        .with(SnapshotField::DemandForecast, 1.1)
        .with(SnapshotField::WorkerUtilizationRate, 0.95)
        .with(SnapshotField::AvailableWorkers, 0.05)
        .with(SnapshotField::EscalatedRequests, 40.0)
        .with(SnapshotField::TotalRequests, 100.0)
        .with(SnapshotField::ResolutionTimeLowLiteracy, 10.0)
        .with(SnapshotField::ResolutionTimeHighLiteracy, 8.0);

    let result = compute_metrics(&snapshot);
    assert_eq!(result.priority_level, Some(PriorityLevel::Critical));
    assert_eq!(
        result.recommendations,
        vec![
            "Deploy emergency medical reinforcements",
            "Activate surge ICU capacity and inter-district patient transfer",
            "Fast-track critical infrastructure repairs",
            "Redeploy workers from low-contention districts",
            "Review escalation handling to reduce request backlog",
            "Audit resolution times across literacy segments",
            "IMMEDIATE ACTION REQUIRED: Cross-sectoral intervention needed",
            "Health-Worker Capacity Gap: Consider resource reallocation",
        ]
    );
    assert_eq!(result.all_issues[0], "High bed occupancy (>85%)");
    assert!(result
        .all_issues
        .contains(&"Health vulnerability at CRITICAL level (HVI: 10.00)".to_string()));
    assert!(result
        .all_issues
        .contains(&"Very high worker utilization (>90%)".to_string()));
}

#[test]
fn test_calm_district_has_no_recommendations() {
    let snapshot = DistrictOperationalSnapshot::new("Jalgaon")
        .with(SnapshotField::PredictedEmergencyCases, 40.0)
        .with(SnapshotField::IcuBeds, 40.0)
        .with(SnapshotField::BedOccupancyRate, 0.5)
        .with(SnapshotField::BedCapacity, 1.0)
        .with(SnapshotField::ResolutionTimeLowLiteracy, 8.0)
        .with(SnapshotField::ResolutionTimeHighLiteracy, 8.0);

    let result = compute_metrics(&snapshot);
    assert_eq!(result.priority_level, Some(PriorityLevel::Low));
    assert!(result.recommendations.is_empty());
    assert_eq!(result.explanation[0], "P-Score: 0.50/10");
    assert_eq!(
        result.explanation.last().map(String::as_str),
        Some("Priority Level: LOW priority - routine monitoring")
    );
}

#[test]
fn test_compute_metrics_is_idempotent() {
    let snapshot = full_snapshot("Thane");
    let first = serde_json::to_string(&compute_metrics(&snapshot)).unwrap();
    let second = serde_json::to_string(&compute_metrics(&snapshot)).unwrap();
    assert_eq!(first, second);
}

fn arb_input() -> impl Strategy<Value = f64> {
    0.0f64..1000.0
}

fn arb_denominator() -> impl Strategy<Value = f64> {
    0.01f64..1000.0
}

proptest! {
    #[test]
    fn prop_scores_stay_in_range(
        emergency in arb_input(),
        icu in arb_denominator(),
        occupancy in 0.0f64..1.0,
        capacity in arb_denominator(),
        volume in arb_input(),
        infra in arb_denominator(),
        forecast in 0.0f64..5.0,
        utilization in 0.0f64..1.0,
        workers in arb_denominator(),
        escalated in arb_input(),
        total in arb_denominator(),
    ) {
        let snapshot = DistrictOperationalSnapshot::new("Prop")
            .with(SnapshotField::PredictedEmergencyCases, emergency)
            .with(SnapshotField::IcuBeds, icu)
            .with(SnapshotField::BedOccupancyRate, occupancy)
            .with(SnapshotField::BedCapacity, capacity)
            .with(SnapshotField::ServiceRequestVolume, volume)
            .with(SnapshotField::InfrastructureCapacity, infra)
            .with(SnapshotField::DemandForecast, forecast)
            .with(SnapshotField::WorkerUtilizationRate, utilization)
            .with(SnapshotField::AvailableWorkers, workers)
            .with(SnapshotField::EscalatedRequests, escalated)
            .with(SnapshotField::TotalRequests, total);
        let result = compute_metrics(&snapshot);

        for kind in [
            MetricKind::Hvi,
            MetricKind::Iss,
            MetricKind::Rcs,
            MetricKind::PScore,
            MetricKind::CapacityGap,
        ] {
            let v = result.score(kind).value().unwrap();
            prop_assert!((0.0..=10.0).contains(&v), "{} = {}", kind, v);
        }
    }

    #[test]
    fn prop_sel_gap_matches_priority(low in 0.0f64..100.0, high in 0.1f64..100.0) {
        let sel = low / high;
        prop_assume!((sel - 1.2).abs() > 1e-9);

        let snapshot = DistrictOperationalSnapshot::new("Prop")
            .with(SnapshotField::ResolutionTimeLowLiteracy, low)
            .with(SnapshotField::ResolutionTimeHighLiteracy, high);
        let result = compute_metrics(&snapshot);

        let elevated = matches!(
            result.sel_priority,
            Some(PriorityLevel::High) | Some(PriorityLevel::Critical)
        );
        prop_assert_eq!(sel > 1.2, elevated);
        prop_assert_eq!(result.equity_gap, elevated);
    }

    #[test]
    fn prop_capacity_gap_monotonic(
        hvi_cases in 0.0f64..500.0,
        extra_cases in 0.0f64..500.0,
        workers in 0.0f64..200.0,
        extra_workers in 0.0f64..200.0,
    ) {
        let base = DistrictOperationalSnapshot::new("Prop")
            .with(SnapshotField::IcuBeds, 50.0)
            .with(SnapshotField::BedOccupancyRate, 0.9)
            .with(SnapshotField::BedCapacity, 1.0);
        let gap = |cases: f64, workers: f64| {
            let snapshot = base
                .clone()
                .with(SnapshotField::PredictedEmergencyCases, cases)
                .with(SnapshotField::AvailableWorkers, workers);
            compute_metrics(&snapshot)
                .health_worker_capacity_gap
                .value()
                .unwrap()
        };

        let g = gap(hvi_cases, workers);
        prop_assert!((0.0..=10.0).contains(&g));
        prop_assert!(gap(hvi_cases + extra_cases, workers) >= g);
        prop_assert!(gap(hvi_cases, workers + extra_workers) <= g);
    }
}
