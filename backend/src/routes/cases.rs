use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =========================================================
// Case statistics types + route
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Dataset-wide totals over all case records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_cases: f64,
    pub avg_weekly_cases: f64,
    pub total_weeks: usize,
    pub unique_wards: usize,
    pub unique_diseases: usize,
    pub date_range: Option<DateRange>,
}

/// Per-disease totals, largest first (parallel arrays for charting).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiseaseDistribution {
    pub diseases: Vec<String>,
    pub total_cases: Vec<f64>,
    pub avg_cases: Vec<f64>,
}

/// Top wards by total cases.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WardAnalysis {
    pub wards: Vec<String>,
    pub total_cases: Vec<f64>,
    pub avg_cases: Vec<f64>,
    pub num_diseases: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    #[default]
    Weekly,
    Monthly,
}

/// Case totals bucketed by week or month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeTrends {
    pub period: TrendPeriod,
    pub periods: Vec<String>,
    pub total_cases: Vec<f64>,
    pub avg_cases: Vec<f64>,
}

/// Correlation of one exogenous column with `new_cases`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub variable: String,
    pub coefficient: f64,
}

/// Correlations of `new_cases` with every usable exogenous column, strongest
/// (by absolute value) first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CorrelationAnalysis {
    pub correlations: Vec<Correlation>,
    /// `new_cases` followed by every exogenous column present in the table.
    pub available_vars: Vec<String>,
}

pub const GET_OVERALL_STATS: &str = "get_overall_stats";
pub const GET_DISEASE_DISTRIBUTION: &str = "get_disease_distribution";
pub const GET_WARD_ANALYSIS: &str = "get_ward_analysis";
pub const GET_TIME_TRENDS: &str = "get_time_trends";
pub const GET_CORRELATIONS: &str = "get_correlations";
