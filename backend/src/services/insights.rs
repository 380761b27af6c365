//! Rule-based narrative for forecasts.
//!
//! All figures are derived once into an [`InsightContext`]; each insight
//! category is then a table of rules over that context.

use chrono::Datelike;
use std::collections::BTreeMap;

use crate::api::{ForecastInsights, ForecastPoint, ForecastSeries};
use crate::config::ForecastConfig;
use crate::services::rules::{evaluate, Rule};
use crate::services::stats;

/// Points of history after which the seasonal peak is reported.
const PEAK_MONTH_MIN_POINTS: usize = 52;
/// Relative move of the next period against the last observation that counts
/// as a change.
const NEXT_PERIOD_BAND: f64 = 0.15;
/// Share of the historical maximum at which a forecast peak is flagged.
const PEAK_SHARE: f64 = 0.8;
const MAPE_GOOD: f64 = 20.0;
const MAPE_MODERATE: f64 = 40.0;

/// Figures the insight rules read.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightContext {
    pub window: usize,
    pub recent_mean: Option<f64>,
    pub previous_mean: Option<f64>,
    /// Percent change of `recent_mean` over `previous_mean`.
    pub change_pct: Option<f64>,
    pub stable_band_pct: f64,
    pub peak_month: Option<String>,
    pub last_value: Option<f64>,
    pub next_value: Option<f64>,
    pub forecast_mean: Option<f64>,
    pub forecast_max: Option<f64>,
    /// `forecast_mean / recent_mean`.
    pub forecast_ratio: Option<f64>,
    pub increase_ratio: f64,
    pub decrease_ratio: f64,
    pub risk_percentile: f64,
    pub historical_percentile: Option<f64>,
    pub historical_max: Option<f64>,
    pub mape_pct: Option<f64>,
}

impl InsightContext {
    pub fn new(
        history: &ForecastSeries,
        forecast: &[ForecastPoint],
        mape_pct: Option<f64>,
        config: &ForecastConfig,
    ) -> Self {
        let values = history.values();
        let n = values.len();

        // Fall back to halves of the history when it is shorter than two
        // full windows.
        let window = config.trend_window.min(n / 2);
        let (recent_mean, previous_mean) = if window == 0 {
            (None, None)
        } else {
            (
                stats::mean(&values[n - window..]),
                stats::mean(&values[n - 2 * window..n - window]),
            )
        };
        let change_pct = match (recent_mean, previous_mean) {
            (Some(r), Some(p)) if p > 0.0 => Some((r - p) / p * 100.0),
            _ => None,
        };

        let predicted: Vec<f64> = forecast.iter().map(|p| p.value).collect();
        let forecast_mean = stats::mean(&predicted);
        let forecast_ratio = match (forecast_mean, recent_mean) {
            (Some(f), Some(r)) if r > 0.0 => Some(f / r),
            _ => None,
        };

        let peak_month = if n > PEAK_MONTH_MIN_POINTS {
            peak_month(history)
        } else {
            None
        };

        Self {
            window,
            recent_mean,
            previous_mean,
            change_pct,
            stable_band_pct: config.stable_band_pct,
            peak_month,
            last_value: values.last().copied(),
            next_value: predicted.first().copied(),
            forecast_mean,
            forecast_max: stats::max(&predicted),
            forecast_ratio,
            increase_ratio: config.increase_ratio,
            decrease_ratio: config.decrease_ratio,
            risk_percentile: config.risk_percentile,
            historical_percentile: stats::percentile(&values, config.risk_percentile),
            historical_max: stats::max(&values),
            mape_pct,
        }
    }

    pub fn trend_up(&self) -> bool {
        self.change_pct.is_some_and(|c| c > self.stable_band_pct)
    }

    pub fn trend_down(&self) -> bool {
        self.change_pct.is_some_and(|c| c < -self.stable_band_pct)
    }

    pub fn significant_increase(&self) -> bool {
        self.forecast_ratio.is_some_and(|r| r > self.increase_ratio)
    }

    pub fn significant_decrease(&self) -> bool {
        self.forecast_ratio.is_some_and(|r| r < self.decrease_ratio)
    }

    pub fn capacity_breach(&self) -> bool {
        matches!(
            (self.forecast_mean, self.historical_percentile),
            (Some(f), Some(p)) if f > p
        )
    }

    pub fn near_historical_peak(&self) -> bool {
        matches!(
            (self.forecast_max, self.historical_max),
            (Some(f), Some(m)) if m > 0.0 && f > PEAK_SHARE * m
        )
    }

    pub fn low_accuracy(&self) -> bool {
        self.mape_pct.map_or(true, |m| m >= MAPE_MODERATE)
    }

    fn any_risk(&self) -> bool {
        self.capacity_breach() || self.near_historical_peak()
    }
}

/// Month (by name) with the largest total across the history.
fn peak_month(history: &ForecastSeries) -> Option<String> {
    let mut totals: BTreeMap<u32, (f64, String)> = BTreeMap::new();
    for p in &history.points {
        let entry = totals
            .entry(p.date.month())
            .or_insert_with(|| (0.0, p.date.format("%B").to_string()));
        entry.0 += p.value;
    }
    totals
        .into_values()
        .fold(None::<(f64, String)>, |best, cur| match best {
            Some(b) if b.0 >= cur.0 => Some(b),
            _ => Some(cur),
        })
        .filter(|(total, _)| *total > 0.0)
        .map(|(_, name)| name)
}

fn f1(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}", v)).unwrap_or_default()
}

const TREND_RULES: &[Rule<InsightContext>] = &[
    Rule::new(
        "trend_up",
        |c| c.trend_up(),
        |c| {
            format!(
                "Cases are increasing: the last {} periods average {} vs {} before (+{}%)",
                c.window,
                f1(c.recent_mean),
                f1(c.previous_mean),
                f1(c.change_pct)
            )
        },
    ),
    Rule::new(
        "trend_down",
        |c| c.trend_down(),
        |c| {
            format!(
                "Cases are decreasing: the last {} periods average {} vs {} before ({}%)",
                c.window,
                f1(c.recent_mean),
                f1(c.previous_mean),
                f1(c.change_pct)
            )
        },
    ),
    Rule::new(
        "trend_stable",
        |c| c.change_pct.is_some() && !c.trend_up() && !c.trend_down(),
        |c| {
            format!(
                "Cases are stable: the last {} periods are within {:.0}% of the preceding {} ({}%)",
                c.window,
                c.stable_band_pct,
                c.window,
                f1(c.change_pct)
            )
        },
    ),
    Rule::new(
        "trend_unknown",
        |c| c.change_pct.is_none(),
        |_| "Not enough non-zero history to assess the recent trend".to_string(),
    ),
    Rule::new(
        "peak_month",
        |c| c.peak_month.is_some(),
        |c| {
            format!(
                "Historically, cases peak in {}",
                c.peak_month.as_deref().unwrap_or_default()
            )
        },
    ),
];

const FORECAST_RULES: &[Rule<InsightContext>] = &[
    Rule::new(
        "significant_increase",
        |c| c.significant_increase(),
        |c| {
            format!(
                "Significant increase expected: forecast average {} vs recent average {}",
                f1(c.forecast_mean),
                f1(c.recent_mean)
            )
        },
    ),
    Rule::new(
        "significant_decrease",
        |c| c.significant_decrease(),
        |c| {
            format!(
                "Significant decrease expected: forecast average {} vs recent average {}",
                f1(c.forecast_mean),
                f1(c.recent_mean)
            )
        },
    ),
    Rule::new(
        "close_to_recent",
        |c| c.forecast_ratio.is_some() && !c.significant_increase() && !c.significant_decrease(),
        |c| {
            format!(
                "Forecast stays close to recent levels: average {} vs {}",
                f1(c.forecast_mean),
                f1(c.recent_mean)
            )
        },
    ),
    Rule::new(
        "next_above_last",
        |c| matches!((c.next_value, c.last_value), (Some(n), Some(l)) if n > l * (1.0 + NEXT_PERIOD_BAND)),
        |c| {
            format!(
                "Next period is expected above the last observed value ({} vs {})",
                f1(c.next_value),
                f1(c.last_value)
            )
        },
    ),
    Rule::new(
        "next_below_last",
        |c| matches!((c.next_value, c.last_value), (Some(n), Some(l)) if n < l * (1.0 - NEXT_PERIOD_BAND)),
        |c| {
            format!(
                "Next period is expected below the last observed value ({} vs {})",
                f1(c.next_value),
                f1(c.last_value)
            )
        },
    ),
    Rule::new(
        "next_near_last",
        |c| {
            matches!((c.next_value, c.last_value), (Some(n), Some(l))
                if n >= l * (1.0 - NEXT_PERIOD_BAND) && n <= l * (1.0 + NEXT_PERIOD_BAND))
        },
        |c| {
            format!(
                "Next period is expected near the last observed value ({})",
                f1(c.last_value)
            )
        },
    ),
    Rule::new(
        "accuracy_good",
        |c| c.mape_pct.is_some_and(|m| m < MAPE_GOOD),
        |c| format!("Model accuracy is good (MAPE {}%)", f1(c.mape_pct)),
    ),
    Rule::new(
        "accuracy_moderate",
        |c| c.mape_pct.is_some_and(|m| (MAPE_GOOD..MAPE_MODERATE).contains(&m)),
        |c| format!("Model accuracy is moderate (MAPE {}%)", f1(c.mape_pct)),
    ),
    Rule::new(
        "accuracy_low",
        |c| c.mape_pct.is_some_and(|m| m >= MAPE_MODERATE),
        |c| {
            format!(
                "Model accuracy is low (MAPE {}%), treat the forecast with caution",
                f1(c.mape_pct)
            )
        },
    ),
    Rule::new(
        "accuracy_unknown",
        |c| c.mape_pct.is_none(),
        |_| "Model accuracy could not be assessed on a hold-out window".to_string(),
    ),
];

const RISK_RULES: &[Rule<InsightContext>] = &[
    Rule::new(
        "capacity_breach",
        |c| c.capacity_breach(),
        |c| {
            format!(
                "Elevated risk of capacity breach: forecast average {} exceeds the historical {:.0}th percentile ({})",
                f1(c.forecast_mean),
                c.risk_percentile,
                f1(c.historical_percentile)
            )
        },
    ),
    Rule::new(
        "near_peak",
        |c| c.near_historical_peak(),
        |c| {
            format!(
                "Forecast peak {} is above {:.0}% of the historical maximum ({})",
                f1(c.forecast_max),
                PEAK_SHARE * 100.0,
                f1(c.historical_max)
            )
        },
    ),
    Rule::new(
        "no_risk",
        |c| !c.any_risk(),
        |_| "No elevated risk detected in the forecast horizon".to_string(),
    ),
];

const RECOMMENDATION_RULES: &[Rule<InsightContext>] = &[
    Rule::new(
        "scale_up",
        |c| c.significant_increase() || c.trend_up(),
        |_| "Scale up surveillance and treatment capacity for the coming periods".to_string(),
    ),
    Rule::new(
        "preposition",
        |c| c.capacity_breach(),
        |_| "Pre-position medical supplies and staff in the affected wards".to_string(),
    ),
    Rule::new(
        "surge_plan",
        |c| c.near_historical_peak(),
        |_| "Prepare surge plans for peak-level case loads".to_string(),
    ),
    Rule::new(
        "maintain",
        |c| c.significant_decrease(),
        |_| "Maintain current measures and monitor for a rebound".to_string(),
    ),
    Rule::new(
        "validate",
        |c| c.low_accuracy(),
        |_| "Validate the forecast against field reports before acting on it".to_string(),
    ),
    Rule::new(
        "routine",
        |c| {
            !(c.significant_increase()
                || c.trend_up()
                || c.any_risk()
                || c.significant_decrease()
                || c.low_accuracy())
        },
        |_| "Continue routine monitoring".to_string(),
    ),
];

/// Evaluate every insight table over a context.
pub fn generate_insights(ctx: &InsightContext) -> ForecastInsights {
    ForecastInsights {
        trend_analysis: evaluate(TREND_RULES, ctx),
        forecast_insights: evaluate(FORECAST_RULES, ctx),
        risk_assessment: evaluate(RISK_RULES, ctx),
        recommendations: evaluate(RECOMMENDATION_RULES, ctx),
    }
}
