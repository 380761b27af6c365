//! Metric engine: HVI, ISS, RCS, P-Score, SEL and the health-worker capacity
//! gap for one district snapshot.
//!
//! Every computation is a pure function of the snapshot and the engine's
//! configuration. A sub-score whose inputs are missing, negative, non-finite
//! or whose denominator is zero is reported as unavailable with a reason; it
//! is never replaced by zero.

use crate::api::{
    ComponentPriority, DistrictOperationalSnapshot, MetricKind, MetricResult, MetricUnavailable,
    PriorityLevel, SnapshotField,
};
use crate::config::{AnalyticsConfig, CapacityGapConfig, ThresholdConfig, WeightConfig};
use crate::services::rules::{evaluate_all, Rule};

/// Upper bound of every clamped score.
pub const SCORE_MAX: f64 = 10.0;

/// RCS at which redeploying workers is recommended.
const RCS_REDEPLOY: f64 = 7.0;
/// Escalated share of requests above which escalation handling is flagged.
const ESCALATION_RATE_LIMIT: f64 = 0.2;
const BED_OCCUPANCY_LIMIT: f64 = 0.85;
const ICU_BEDS_FLOOR: f64 = 20.0;
const EMERGENCY_CASES_LIMIT: f64 = 500.0;
const REQUEST_VOLUME_LIMIT: f64 = 50.0;
const DEMAND_FORECAST_LIMIT: f64 = 1.0;
const UTILIZATION_LIMIT: f64 = 0.9;
/// SEL above which underserved segments wait over 50% longer.
const SEL_SEVERE: f64 = 1.5;

type Score = Result<f64, MetricUnavailable>;

/// Computes [`MetricResult`]s with a fixed configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEngine {
    weights: WeightConfig,
    thresholds: ThresholdConfig,
    capacity_gap: CapacityGapConfig,
}

impl Default for MetricEngine {
    fn default() -> Self {
        Self::new(&AnalyticsConfig::default())
    }
}

impl MetricEngine {
    /// Build an engine; weights are normalised to sum to 1.0.
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            weights: config.weights.normalised(),
            thresholds: config.thresholds,
            capacity_gap: config.capacity_gap,
        }
    }

    pub fn weights(&self) -> &WeightConfig {
        &self.weights
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    /// Classify a 0..10 score.
    pub fn classify(&self, score: f64) -> PriorityLevel {
        if score >= self.thresholds.critical {
            PriorityLevel::Critical
        } else if score >= self.thresholds.high {
            PriorityLevel::High
        } else if score >= self.thresholds.medium {
            PriorityLevel::Medium
        } else {
            PriorityLevel::Low
        }
    }

    /// Classify an SEL ratio. Only LOW, HIGH and CRITICAL are used.
    pub fn classify_sel(&self, sel: f64) -> PriorityLevel {
        if sel >= self.thresholds.sel_critical {
            PriorityLevel::Critical
        } else if sel >= self.thresholds.sel_high {
            PriorityLevel::High
        } else {
            PriorityLevel::Low
        }
    }

    pub fn hvi(&self, s: &DistrictOperationalSnapshot) -> Score {
        let emergency = input(s, SnapshotField::PredictedEmergencyCases)?;
        let icu = denominator(s, SnapshotField::IcuBeds)?;
        let occupancy = input(s, SnapshotField::BedOccupancyRate)?;
        let capacity = denominator(s, SnapshotField::BedCapacity)?;
        Ok(clamp_score((emergency / icu) * (occupancy / capacity)))
    }

    pub fn iss(&self, s: &DistrictOperationalSnapshot) -> Score {
        let volume = input(s, SnapshotField::ServiceRequestVolume)?;
        let capacity = denominator(s, SnapshotField::InfrastructureCapacity)?;
        let forecast = input(s, SnapshotField::DemandForecast)?;
        Ok(clamp_score((volume / capacity) * forecast))
    }

    pub fn rcs(&self, s: &DistrictOperationalSnapshot) -> Score {
        let utilization = input(s, SnapshotField::WorkerUtilizationRate)?;
        let workers = denominator(s, SnapshotField::AvailableWorkers)?;
        let escalated = input(s, SnapshotField::EscalatedRequests)?;
        let total = denominator(s, SnapshotField::TotalRequests)?;
        Ok(clamp_score((utilization / workers) * (escalated / total)))
    }

    /// Ratio of low- to high-literacy resolution time. Not clamped.
    pub fn sel(&self, s: &DistrictOperationalSnapshot) -> Score {
        let low = input(s, SnapshotField::ResolutionTimeLowLiteracy)?;
        let high = denominator(s, SnapshotField::ResolutionTimeHighLiteracy)?;
        Ok(low / high)
    }

    /// HVI damped by available workers: `HVI * h / (h + workers)`.
    ///
    /// Equals the HVI when no workers are available and halves it at `h`
    /// workers.
    pub fn capacity_gap(&self, s: &DistrictOperationalSnapshot, hvi: &Score) -> Score {
        let hvi = match hvi {
            Ok(v) => *v,
            Err(_) => {
                return Err(MetricUnavailable::Dependency {
                    metric: MetricKind::Hvi,
                })
            }
        };
        let workers = input(s, SnapshotField::AvailableWorkers)?;
        let h = self.capacity_gap.half_saturation_workers;
        Ok(clamp_score(hvi * h / (h + workers)))
    }

    /// Weighted combination of the available sub-scores.
    ///
    /// With all three available this is exactly
    /// `w_hvi*HVI + w_iss*ISS + w_rcs*RCS`; otherwise the weights of the
    /// available scores are renormalised to sum to one.
    pub fn p_score(&self, hvi: &Score, iss: &Score, rcs: &Score) -> Score {
        let w = &self.weights;
        if let (Ok(h), Ok(i), Ok(r)) = (hvi, iss, rcs) {
            return Ok(clamp_score(w.hvi * h + w.iss * i + w.rcs * r));
        }

        let mut weighted = 0.0;
        let mut weight_sum = 0.0;
        for (score, weight) in [(hvi, w.hvi), (iss, w.iss), (rcs, w.rcs)] {
            if let Ok(value) = score {
                weighted += weight * value;
                weight_sum += weight;
            }
        }
        if weight_sum <= 0.0 {
            return Err(MetricUnavailable::NoComponents);
        }
        Ok(clamp_score(weighted / weight_sum))
    }

    /// Effective weight of each component in the P-Score, after
    /// renormalisation over the available ones.
    fn effective_weights(&self, hvi: &Score, iss: &Score, rcs: &Score) -> [(MetricKind, f64); 3] {
        let w = &self.weights;
        let parts = [
            (MetricKind::Hvi, hvi.is_ok(), w.hvi),
            (MetricKind::Iss, iss.is_ok(), w.iss),
            (MetricKind::Rcs, rcs.is_ok(), w.rcs),
        ];
        let sum: f64 = parts.iter().filter(|p| p.1).map(|p| p.2).sum();
        parts.map(|(kind, ok, weight)| {
            let effective = if ok && sum > 0.0 { weight / sum } else { 0.0 };
            (kind, effective)
        })
    }

    /// Compute every metric, priority, recommendation and issue for a
    /// snapshot.
    pub fn compute_metrics(&self, snapshot: &DistrictOperationalSnapshot) -> MetricResult {
        let hvi = self.hvi(snapshot);
        let iss = self.iss(snapshot);
        let rcs = self.rcs(snapshot);
        let sel = self.sel(snapshot);
        let gap = self.capacity_gap(snapshot, &hvi);
        let p = self.p_score(&hvi, &iss, &rcs);

        let ctx = RuleContext {
            thresholds: self.thresholds,
            inputs: RuleInputs::from_snapshot(snapshot),
            hvi: hvi.as_ref().ok().copied(),
            iss: iss.as_ref().ok().copied(),
            rcs: rcs.as_ref().ok().copied(),
            p: p.as_ref().ok().copied(),
            sel: sel.as_ref().ok().copied(),
            gap: gap.as_ref().ok().copied(),
        };

        let recommendations = evaluate_all(
            &[
                HEALTH_RECOMMENDATIONS,
                INFRASTRUCTURE_RECOMMENDATIONS,
                RESOURCE_RECOMMENDATIONS,
                EQUITY_RECOMMENDATIONS,
                CROSS_SECTORAL_RECOMMENDATIONS,
            ],
            &ctx,
        );

        let mut all_issues = evaluate_all(
            &[HEALTH_ISSUES, INFRASTRUCTURE_ISSUES, RESOURCE_ISSUES, EQUITY_ISSUES],
            &ctx,
        );
        let scores = [
            (MetricKind::PScore, &p),
            (MetricKind::Hvi, &hvi),
            (MetricKind::Iss, &iss),
            (MetricKind::Rcs, &rcs),
            (MetricKind::Sel, &sel),
            (MetricKind::CapacityGap, &gap),
        ];
        for (kind, score) in scores {
            if let Err(reason) = score {
                all_issues.push(format!("{} unavailable: {}", kind.label(), reason));
            }
        }

        let priority_level = ctx.p.map(|v| self.classify(v));
        let sel_priority = ctx.sel.map(|v| self.classify_sel(v));
        let equity_gap = ctx.sel.is_some_and(|v| v > self.thresholds.sel_high);

        let component_priorities = [
            (MetricKind::Hvi, ctx.hvi),
            (MetricKind::Iss, ctx.iss),
            (MetricKind::Rcs, ctx.rcs),
            (MetricKind::CapacityGap, ctx.gap),
        ]
        .into_iter()
        .filter_map(|(metric, value)| {
            value.map(|v| ComponentPriority {
                metric,
                level: self.classify(v),
            })
        })
        .collect();

        let explanation = self.explain(&hvi, &iss, &rcs, &p, priority_level);

        MetricResult {
            district: snapshot.district.clone(),
            hvi_score: hvi.into(),
            iss_score: iss.into(),
            rcs_score: rcs.into(),
            p_score: p.into(),
            sel_index: sel.into(),
            health_worker_capacity_gap: gap.into(),
            priority_level,
            sel_priority,
            equity_gap,
            component_priorities,
            recommendations,
            all_issues,
            explanation,
        }
    }

    fn explain(
        &self,
        hvi: &Score,
        iss: &Score,
        rcs: &Score,
        p: &Score,
        priority: Option<PriorityLevel>,
    ) -> Vec<String> {
        let mut lines = Vec::with_capacity(5);
        match p {
            Ok(value) => lines.push(format!("P-Score: {:.2}/10", value)),
            Err(reason) => lines.push(format!("P-Score: unavailable ({})", reason)),
        }

        let effective = self.effective_weights(hvi, iss, rcs);
        for ((kind, weight), score) in effective.iter().zip([hvi, iss, rcs]) {
            match score {
                Ok(value) => lines.push(format!(
                    "{}: {:.2} (weight: {:.1}%, contribution: {:.2})",
                    kind.label(),
                    value,
                    weight * 100.0,
                    value * weight
                )),
                Err(reason) => lines.push(format!(
                    "{}: unavailable ({}), excluded from the P-Score",
                    kind.label(),
                    reason
                )),
            }
        }

        if let Some(level) = priority {
            lines.push(format!("Priority Level: {}", level.guidance()));
        }
        lines
    }
}

/// Compute metrics with the default configuration.
pub fn compute_metrics(snapshot: &DistrictOperationalSnapshot) -> MetricResult {
    MetricEngine::default().compute_metrics(snapshot)
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, SCORE_MAX)
}

/// A usable (present, finite, non-negative) input value.
fn input(s: &DistrictOperationalSnapshot, field: SnapshotField) -> Score {
    match s.get(field) {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(MetricUnavailable::MissingData { field }),
    }
}

/// A usable input that is also safe to divide by.
fn denominator(s: &DistrictOperationalSnapshot, field: SnapshotField) -> Score {
    let value = input(s, field)?;
    if value == 0.0 {
        return Err(MetricUnavailable::DivisionGuard { field });
    }
    Ok(value)
}

// =========================================================
// Rule tables
// =========================================================

/// Raw inputs the rule tables look at, already validated.
#[derive(Debug, Clone, Copy)]
struct RuleInputs {
    bed_occupancy_rate: Option<f64>,
    icu_beds: Option<f64>,
    predicted_emergency_cases: Option<f64>,
    service_request_volume: Option<f64>,
    demand_forecast: Option<f64>,
    worker_utilization_rate: Option<f64>,
    escalation_rate: Option<f64>,
}

impl RuleInputs {
    fn from_snapshot(s: &DistrictOperationalSnapshot) -> Self {
        let value = |field| input(s, field).ok();
        let escalation_rate = match (
            input(s, SnapshotField::EscalatedRequests),
            denominator(s, SnapshotField::TotalRequests),
        ) {
            (Ok(escalated), Ok(total)) => Some(escalated / total),
            _ => None,
        };
        Self {
            bed_occupancy_rate: value(SnapshotField::BedOccupancyRate),
            icu_beds: value(SnapshotField::IcuBeds),
            predicted_emergency_cases: value(SnapshotField::PredictedEmergencyCases),
            service_request_volume: value(SnapshotField::ServiceRequestVolume),
            demand_forecast: value(SnapshotField::DemandForecast),
            worker_utilization_rate: value(SnapshotField::WorkerUtilizationRate),
            escalation_rate,
        }
    }
}

struct RuleContext {
    thresholds: ThresholdConfig,
    inputs: RuleInputs,
    hvi: Option<f64>,
    iss: Option<f64>,
    rcs: Option<f64>,
    p: Option<f64>,
    sel: Option<f64>,
    gap: Option<f64>,
}

fn above(value: Option<f64>, limit: f64) -> bool {
    value.is_some_and(|v| v > limit)
}

fn at_least(value: Option<f64>, limit: f64) -> bool {
    value.is_some_and(|v| v >= limit)
}

fn within(value: Option<f64>, low: f64, high: f64) -> bool {
    value.is_some_and(|v| v >= low && v < high)
}

impl RuleContext {
    fn elevated(&self, score: Option<f64>) -> bool {
        at_least(score, self.thresholds.high)
    }

    fn band(&self, score: Option<f64>) -> &'static str {
        if at_least(score, self.thresholds.critical) {
            "CRITICAL"
        } else {
            "HIGH"
        }
    }
}

fn fmt2(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

const HEALTH_RECOMMENDATIONS: &[Rule<RuleContext>] = &[
    Rule::new(
        "hvi_critical_reinforce",
        |c| at_least(c.hvi, c.thresholds.critical),
        |_| "Deploy emergency medical reinforcements".to_string(),
    ),
    Rule::new(
        "hvi_critical_surge",
        |c| at_least(c.hvi, c.thresholds.critical),
        |_| "Activate surge ICU capacity and inter-district patient transfer".to_string(),
    ),
    Rule::new(
        "hvi_high",
        |c| within(c.hvi, c.thresholds.high, c.thresholds.critical),
        |_| "Increase ICU bed capacity and monitor occupancy daily".to_string(),
    ),
];

const INFRASTRUCTURE_RECOMMENDATIONS: &[Rule<RuleContext>] = &[
    Rule::new(
        "iss_critical",
        |c| at_least(c.iss, c.thresholds.critical),
        |_| "Fast-track critical infrastructure repairs".to_string(),
    ),
    Rule::new(
        "iss_high",
        |c| within(c.iss, c.thresholds.high, c.thresholds.critical),
        |_| "Increase infrastructure capacity ahead of forecast demand".to_string(),
    ),
];

const RESOURCE_RECOMMENDATIONS: &[Rule<RuleContext>] = &[
    Rule::new(
        "rcs_redeploy",
        |c| at_least(c.rcs, RCS_REDEPLOY),
        |_| "Redeploy workers from low-contention districts".to_string(),
    ),
    Rule::new(
        "escalation_backlog",
        |c| above(c.inputs.escalation_rate, ESCALATION_RATE_LIMIT),
        |_| "Review escalation handling to reduce request backlog".to_string(),
    ),
];

const EQUITY_RECOMMENDATIONS: &[Rule<RuleContext>] = &[
    Rule::new(
        "sel_critical",
        |c| at_least(c.sel, c.thresholds.sel_critical),
        |_| "Equity intervention: prioritise requests from underserved segments".to_string(),
    ),
    Rule::new(
        "sel_high",
        |c| {
            above(c.sel, c.thresholds.sel_high)
                && c.sel.is_some_and(|v| v < c.thresholds.sel_critical)
        },
        |_| "Audit resolution times across literacy segments".to_string(),
    ),
];

const CROSS_SECTORAL_RECOMMENDATIONS: &[Rule<RuleContext>] = &[
    Rule::new(
        "p_score_critical",
        |c| at_least(c.p, c.thresholds.critical),
        |_| "IMMEDIATE ACTION REQUIRED: Cross-sectoral intervention needed".to_string(),
    ),
    Rule::new(
        "capacity_gap",
        |c| above(c.gap, c.thresholds.high),
        |_| "Health-Worker Capacity Gap: Consider resource reallocation".to_string(),
    ),
];

const HEALTH_ISSUES: &[Rule<RuleContext>] = &[
    Rule::new(
        "bed_occupancy",
        |c| above(c.inputs.bed_occupancy_rate, BED_OCCUPANCY_LIMIT),
        |_| "High bed occupancy (>85%)".to_string(),
    ),
    Rule::new(
        "icu_beds",
        |c| c.inputs.icu_beds.is_some_and(|v| v < ICU_BEDS_FLOOR),
        |_| "Low ICU bed capacity".to_string(),
    ),
    Rule::new(
        "emergency_cases",
        |c| above(c.inputs.predicted_emergency_cases, EMERGENCY_CASES_LIMIT),
        |_| "High emergency case volume".to_string(),
    ),
    Rule::new(
        "hvi_elevated",
        |c| c.elevated(c.hvi),
        |c| format!("Health vulnerability at {} level (HVI: {})", c.band(c.hvi), fmt2(c.hvi)),
    ),
];

const INFRASTRUCTURE_ISSUES: &[Rule<RuleContext>] = &[
    Rule::new(
        "request_volume",
        |c| above(c.inputs.service_request_volume, REQUEST_VOLUME_LIMIT),
        |_| "High infrastructure request volume".to_string(),
    ),
    Rule::new(
        "demand_forecast",
        |c| above(c.inputs.demand_forecast, DEMAND_FORECAST_LIMIT),
        |_| "Forecast demand exceeds current load".to_string(),
    ),
    Rule::new(
        "iss_elevated",
        |c| c.elevated(c.iss),
        |c| format!("Infrastructure strain at {} level (ISS: {})", c.band(c.iss), fmt2(c.iss)),
    ),
];

const RESOURCE_ISSUES: &[Rule<RuleContext>] = &[
    Rule::new(
        "utilization",
        |c| above(c.inputs.worker_utilization_rate, UTILIZATION_LIMIT),
        |_| "Very high worker utilization (>90%)".to_string(),
    ),
    Rule::new(
        "escalation_rate",
        |c| above(c.inputs.escalation_rate, ESCALATION_RATE_LIMIT),
        |_| "High escalation rate (>20%)".to_string(),
    ),
    Rule::new(
        "rcs_elevated",
        |c| c.elevated(c.rcs),
        |c| format!("Resource contention at {} level (RCS: {})", c.band(c.rcs), fmt2(c.rcs)),
    ),
];

const EQUITY_ISSUES: &[Rule<RuleContext>] = &[
    Rule::new(
        "equity_gap",
        |c| above(c.sel, c.thresholds.sel_high),
        |c| format!("Significant equity gap detected (SEL: {})", fmt2(c.sel)),
    ),
    Rule::new(
        "equity_gap_severe",
        |c| above(c.sel, SEL_SEVERE),
        |_| "Resolution time is >50% longer in underserved areas".to_string(),
    ),
];

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;
