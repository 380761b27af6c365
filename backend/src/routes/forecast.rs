use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::SeriesPoint;

// =========================================================
// Forecast types + route
// =========================================================

/// A predicted value for one future period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Hold-out accuracy of the forecasting model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastKpis {
    #[serde(rename = "MAE")]
    pub mae: f64,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    /// `None` when every held-out actual is zero.
    #[serde(rename = "MAPE_pct")]
    pub mape_pct: Option<f64>,
    /// Held-out points actually compared.
    pub n_test: usize,
    /// Points skipped by MAPE because the actual was zero.
    pub mape_skipped: usize,
}

/// KPIs, or the reason they could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KpiOutcome {
    Computed { kpis: ForecastKpis, holdout: usize },
    Unavailable { reason: String },
}

impl KpiOutcome {
    pub fn kpis(&self) -> Option<&ForecastKpis> {
        match self {
            KpiOutcome::Computed { kpis, .. } => Some(kpis),
            KpiOutcome::Unavailable { .. } => None,
        }
    }
}

/// Rule-based narrative derived from the history and the forecast.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastInsights {
    pub trend_analysis: Vec<String>,
    pub forecast_insights: Vec<String>,
    pub risk_assessment: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Parameters of the fitted smoothing model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub method: String,
    pub alpha: f64,
    pub beta: f64,
    pub cadence_days: i64,
    pub finetune_steps: usize,
    pub training_sse: f64,
}

/// Complete output of one forecast request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub unique_id: String,
    pub history: Vec<SeriesPoint>,
    pub forecast: Vec<ForecastPoint>,
    pub kpis: KpiOutcome,
    pub insights: ForecastInsights,
    pub model: ModelSummary,
}

/// Names of all forecastable series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesList {
    pub series: Vec<String>,
}

/// Tail of one series, as served to charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesData {
    pub unique_id: String,
    pub data: Vec<SeriesPoint>,
}

/// Hold-out KPIs plus simple level indicators for a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiReport {
    pub unique_id: String,
    pub kpis: KpiOutcome,
    pub last_period_cases: f64,
    pub avg_last_12_periods: f64,
}

pub const FORECAST_SERIES: &str = "forecast_series";
pub const GET_SERIES_KPIS: &str = "get_series_kpis";
pub const LIST_SERIES: &str = "list_series";
