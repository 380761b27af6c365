use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::SnapshotField;

// =========================================================
// Metric types + route
// =========================================================

/// The composite indices produced per district.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    PScore,
    Hvi,
    Iss,
    Rcs,
    Sel,
    CapacityGap,
}

impl MetricKind {
    /// Order used by comparisons and explanations.
    pub const ALL: [MetricKind; 6] = [
        MetricKind::PScore,
        MetricKind::Hvi,
        MetricKind::Iss,
        MetricKind::Rcs,
        MetricKind::Sel,
        MetricKind::CapacityGap,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::PScore => "P-Score",
            MetricKind::Hvi => "HVI",
            MetricKind::Iss => "ISS",
            MetricKind::Rcs => "RCS",
            MetricKind::Sel => "SEL",
            MetricKind::CapacityGap => "Health-Worker Capacity Gap",
        }
    }

    /// Name of the corresponding `MetricResult` field.
    pub fn field_name(&self) -> &'static str {
        match self {
            MetricKind::PScore => "p_score",
            MetricKind::Hvi => "hvi_score",
            MetricKind::Iss => "iss_score",
            MetricKind::Rcs => "rcs_score",
            MetricKind::Sel => "sel_index",
            MetricKind::CapacityGap => "health_worker_capacity_gap",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a sub-score could not be computed.
///
/// Missing inputs and zero denominators are reported, never turned into a
/// score of zero.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricUnavailable {
    #[error("insufficient data: {field} is missing or non-numeric")]
    MissingData { field: SnapshotField },

    #[error("insufficient data: {field} is zero")]
    DivisionGuard { field: SnapshotField },

    #[error("insufficient data: {metric} is unavailable")]
    Dependency { metric: MetricKind },

    #[error("insufficient data: no component score is available")]
    NoComponents,
}

/// A sub-score together with its availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoreValue {
    Available { value: f64 },
    Unavailable { reason: MetricUnavailable },
}

impl ScoreValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            ScoreValue::Available { value } => Some(*value),
            ScoreValue::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ScoreValue::Available { .. })
    }

    pub fn reason(&self) -> Option<&MetricUnavailable> {
        match self {
            ScoreValue::Available { .. } => None,
            ScoreValue::Unavailable { reason } => Some(reason),
        }
    }
}

impl From<Result<f64, MetricUnavailable>> for ScoreValue {
    fn from(result: Result<f64, MetricUnavailable>) -> Self {
        match result {
            Ok(value) => ScoreValue::Available { value },
            Err(reason) => ScoreValue::Unavailable { reason },
        }
    }
}

/// Priority classification of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::Low => "LOW",
            PriorityLevel::Medium => "MEDIUM",
            PriorityLevel::High => "HIGH",
            PriorityLevel::Critical => "CRITICAL",
        }
    }

    /// One-line reading of the level for administrators.
    pub fn guidance(&self) -> &'static str {
        match self {
            PriorityLevel::Critical => "CRITICAL priority - immediate attention required",
            PriorityLevel::High => "HIGH priority - action needed soon",
            PriorityLevel::Medium => "MEDIUM priority - monitor closely",
            PriorityLevel::Low => "LOW priority - routine monitoring",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority of an individual available sub-score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPriority {
    pub metric: MetricKind,
    pub level: PriorityLevel,
}

/// Everything the metric engine derives for one district snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub district: String,
    pub hvi_score: ScoreValue,
    pub iss_score: ScoreValue,
    pub rcs_score: ScoreValue,
    pub p_score: ScoreValue,
    pub sel_index: ScoreValue,
    pub health_worker_capacity_gap: ScoreValue,
    /// Absent when the P-Score itself is unavailable.
    pub priority_level: Option<PriorityLevel>,
    pub sel_priority: Option<PriorityLevel>,
    pub equity_gap: bool,
    pub component_priorities: Vec<ComponentPriority>,
    pub recommendations: Vec<String>,
    pub all_issues: Vec<String>,
    pub explanation: Vec<String>,
}

impl MetricResult {
    pub fn score(&self, kind: MetricKind) -> &ScoreValue {
        match kind {
            MetricKind::PScore => &self.p_score,
            MetricKind::Hvi => &self.hvi_score,
            MetricKind::Iss => &self.iss_score,
            MetricKind::Rcs => &self.rcs_score,
            MetricKind::Sel => &self.sel_index,
            MetricKind::CapacityGap => &self.health_worker_capacity_gap,
        }
    }

    /// Issues truncated for display.
    pub fn top_issues(&self) -> &[String] {
        let n = self.all_issues.len().min(MAX_RENDERED_ISSUES);
        &self.all_issues[..n]
    }
}

/// Issues shown per district in rendered responses.
pub const MAX_RENDERED_ISSUES: usize = 10;

/// Signed difference of one metric between two districts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDifference {
    pub metric: MetricKind,
    /// `a - b`.
    pub difference: f64,
    pub magnitude: f64,
    pub higher_district: String,
}

/// Pairwise comparison of two districts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareData {
    pub district_a: String,
    pub district_b: String,
    pub differences: Vec<MetricDifference>,
}

/// One row of the all-district ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDistrict {
    pub district: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ranked metrics for every district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllDistrictMetrics {
    pub districts: Vec<RankedDistrict>,
    pub total: usize,
    pub failed: usize,
}

/// Metrics for a single district, as served over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictMetricsData {
    pub district: String,
    pub data_version: u64,
    pub metrics: MetricResult,
    pub top_issues: Vec<String>,
}

pub const GET_DISTRICT_METRICS: &str = "get_district_metrics";
pub const GET_ALL_METRICS: &str = "get_all_metrics";
pub const COMPARE_DISTRICTS: &str = "compare_districts";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_value_serialization() {
        let available = ScoreValue::Available { value: 2.7 };
        let json = serde_json::to_value(&available).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["value"], 2.7);

        let unavailable = ScoreValue::Unavailable {
            reason: MetricUnavailable::DivisionGuard {
                field: SnapshotField::IcuBeds,
            },
        };
        let json = serde_json::to_value(&unavailable).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"]["kind"], "division_guard");
        assert_eq!(json["reason"]["field"], "icu_beds");
    }

    #[test]
    fn test_unavailable_message() {
        let reason = MetricUnavailable::MissingData {
            field: SnapshotField::BedCapacity,
        };
        assert_eq!(
            reason.to_string(),
            "insufficient data: bed_capacity is missing or non-numeric"
        );
    }

    #[test]
    fn test_priority_serializes_uppercase() {
        let json = serde_json::to_string(&PriorityLevel::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
        assert!(PriorityLevel::High > PriorityLevel::Medium);
    }

    #[test]
    fn test_route_constants() {
        assert_eq!(GET_DISTRICT_METRICS, "get_district_metrics");
        assert_eq!(GET_ALL_METRICS, "get_all_metrics");
        assert_eq!(COMPARE_DISTRICTS, "compare_districts");
    }
}
