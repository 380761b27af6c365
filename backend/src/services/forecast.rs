//! Forecast pipeline: Holt linear smoothing, hold-out KPIs and insights.
//!
//! Fitting is deterministic and CPU-bound. [`forecast_with_timeout`] moves a
//! fit onto the blocking pool and bounds it with a timeout; fits share no
//! state, so one slow series never blocks another.

use chrono::{Duration as ChronoDuration, NaiveDate};
use std::time::Duration;

use crate::api::{
    ForecastKpis, ForecastPoint, ForecastResult, ForecastSeries, KpiOutcome, KpiReport,
    ModelSummary,
};
use crate::config::ForecastConfig;
use crate::services::insights::{generate_insights, InsightContext};
use crate::services::stats;

pub const DEFAULT_ALPHA: f64 = 0.5;
pub const DEFAULT_BETA: f64 = 0.1;
/// Points needed to fit without tuning (level and trend initialisation).
pub const MIN_FIT_POINTS: usize = 2;
/// Points needed before the grid search has anything to learn from.
pub const MIN_TUNING_POINTS: usize = 8;
/// Periods averaged for the KPI report's level indicator.
const LEVEL_WINDOW: usize = 12;

const PARAM_FLOOR: f64 = 0.01;
const PARAM_CEIL: f64 = 0.99;
const ALPHA_STEP: f64 = 0.25;
const BETA_STEP: f64 = 0.05;

/// Errors raised by the forecast pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastError {
    #[error("forecast horizon must be between 1 and {max}, got {h}")]
    InvalidHorizon { h: usize, max: usize },

    #[error("insufficient history for {purpose}: need at least {required} points, have {available}")]
    InsufficientHistory {
        required: usize,
        available: usize,
        purpose: String,
    },

    #[error("forecast fit failed: {reason}")]
    FitFailed { reason: String },

    #[error("forecast timed out after {0} seconds")]
    Timeout(u64),

    #[error("Unknown series: {0}")]
    UnknownSeries(String),
}

impl ForecastError {
    fn fit_failed(reason: impl Into<String>) -> Self {
        ForecastError::FitFailed {
            reason: reason.into(),
        }
    }
}

/// Smoothing parameters of the Holt model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoltParams {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for HoltParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
        }
    }
}

/// A Holt model fitted to a series.
#[derive(Debug, Clone, PartialEq)]
pub struct HoltModel {
    pub params: HoltParams,
    pub level: f64,
    pub trend: f64,
    /// One-step-ahead squared error over the training values.
    pub sse: f64,
}

/// Run the smoothing recursions and return (level, trend, one-step SSE).
fn smooth(values: &[f64], params: HoltParams) -> (f64, f64, f64) {
    let mut level = values[0];
    let mut trend = values[1] - values[0];
    let mut sse = 0.0;
    for &y in &values[1..] {
        let predicted = level + trend;
        let err = y - predicted;
        sse += err * err;
        let new_level = params.alpha * y + (1.0 - params.alpha) * (level + trend);
        trend = params.beta * (new_level - level) + (1.0 - params.beta) * trend;
        level = new_level;
    }
    (level, trend, sse)
}

fn clamp_param(v: f64) -> f64 {
    v.clamp(PARAM_FLOOR, PARAM_CEIL)
}

impl HoltModel {
    /// Fit with default parameters, refined by `finetune_steps` passes of a
    /// 3x3 grid search around the current best (alpha, beta), halving the grid
    /// step after each pass.
    pub fn fit(values: &[f64], finetune_steps: usize) -> Result<Self, ForecastError> {
        let required = min_history(finetune_steps);
        if values.len() < required {
            return Err(ForecastError::InsufficientHistory {
                required,
                available: values.len(),
                purpose: "model fit".to_string(),
            });
        }

        let mut best = HoltParams::default();
        let (_, _, mut best_sse) = smooth(values, best);
        let mut alpha_step = ALPHA_STEP;
        let mut beta_step = BETA_STEP;

        for _ in 0..finetune_steps {
            let center = best;
            for da in [-alpha_step, 0.0, alpha_step] {
                for db in [-beta_step, 0.0, beta_step] {
                    let candidate = HoltParams {
                        alpha: clamp_param(center.alpha + da),
                        beta: clamp_param(center.beta + db),
                    };
                    let (_, _, sse) = smooth(values, candidate);
                    if sse.is_finite() && sse < best_sse {
                        best = candidate;
                        best_sse = sse;
                    }
                }
            }
            alpha_step /= 2.0;
            beta_step /= 2.0;
        }

        let (level, trend, sse) = smooth(values, best);
        if !(level.is_finite() && trend.is_finite() && sse.is_finite()) {
            return Err(ForecastError::fit_failed("smoothing produced non-finite state"));
        }

        Ok(Self {
            params: best,
            level,
            trend,
            sse,
        })
    }

    /// Predict `h` future values, floored at zero.
    pub fn predict(&self, h: usize) -> Result<Vec<f64>, ForecastError> {
        (1..=h)
            .map(|i| {
                let value = self.level + self.trend * i as f64;
                if value.is_finite() {
                    Ok(value.max(0.0))
                } else {
                    Err(ForecastError::fit_failed(format!(
                        "non-finite prediction at step {}",
                        i
                    )))
                }
            })
            .collect()
    }
}

/// Minimum history length for a fit with `finetune_steps` passes.
pub fn min_history(finetune_steps: usize) -> usize {
    if finetune_steps == 0 {
        MIN_FIT_POINTS
    } else {
        MIN_TUNING_POINTS
    }
}

/// Check ordering and values, and return the series cadence in days.
///
/// The cadence is the median gap between consecutive dates.
pub fn series_cadence(series: &ForecastSeries) -> Result<i64, ForecastError> {
    if let Some(p) = series.points.iter().find(|p| !p.value.is_finite() || p.value < 0.0) {
        return Err(ForecastError::fit_failed(format!(
            "value on {} is negative or not a number",
            p.date
        )));
    }

    let gaps: Vec<f64> = series
        .points
        .windows(2)
        .map(|w| (w[1].date - w[0].date).num_days() as f64)
        .collect();
    if gaps.iter().any(|g| *g <= 0.0) {
        return Err(ForecastError::fit_failed("dates must be strictly ascending"));
    }

    match stats::median(&gaps) {
        Some(median) => Ok((median.round() as i64).max(1)),
        None => Err(ForecastError::InsufficientHistory {
            required: MIN_FIT_POINTS,
            available: series.len(),
            purpose: "cadence detection".to_string(),
        }),
    }
}

/// Dates of the `h` periods following `last`.
fn future_dates(
    last: NaiveDate,
    cadence_days: i64,
    h: usize,
) -> Result<Vec<NaiveDate>, ForecastError> {
    (1..=h as i64)
        .map(|i| {
            cadence_days
                .checked_mul(i)
                .and_then(ChronoDuration::try_days)
                .and_then(|offset| last.checked_add_signed(offset))
                .ok_or_else(|| {
                    ForecastError::fit_failed(format!(
                        "forecast date {} periods after {} is out of range",
                        i, last
                    ))
                })
        })
        .collect()
}

/// MAE, RMSE and MAPE of `predicted` against `actual`.
///
/// MAPE skips points whose actual value is zero and is `None` when every
/// point is skipped.
pub fn compute_kpis(actual: &[f64], predicted: &[f64]) -> ForecastKpis {
    let n = actual.len().min(predicted.len());
    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| a - p)
        .collect();

    let mae = stats::mean(&errors.iter().map(|e| e.abs()).collect::<Vec<_>>()).unwrap_or(0.0);
    let rmse = stats::mean(&errors.iter().map(|e| e * e).collect::<Vec<_>>())
        .unwrap_or(0.0)
        .sqrt();

    let pct: Vec<f64> = actual
        .iter()
        .zip(&errors)
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, e)| (e / a).abs() * 100.0)
        .collect();

    ForecastKpis {
        mae,
        rmse,
        mape_pct: stats::mean(&pct),
        n_test: n,
        mape_skipped: n - pct.len(),
    }
}

/// The forecast pipeline with its configuration.
#[derive(Debug, Clone, Default)]
pub struct ForecastPipeline {
    config: ForecastConfig,
}

impl ForecastPipeline {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    fn effective_steps(&self, finetune_steps: usize) -> usize {
        finetune_steps.min(self.config.max_finetune_steps)
    }

    /// Reject a horizon of zero or beyond the configured maximum.
    pub fn check_horizon(&self, h: usize) -> Result<(), ForecastError> {
        let max = self.config.max_horizon;
        if h == 0 || h > max {
            return Err(ForecastError::InvalidHorizon { h, max });
        }
        Ok(())
    }

    /// Fit on all but the last `k` points and score the prediction of those
    /// `k` points.
    ///
    /// Requires at least `3k` points, and enough training points for the fit.
    pub fn holdout_kpis(
        &self,
        series: &ForecastSeries,
        k: usize,
        finetune_steps: usize,
    ) -> Result<ForecastKpis, ForecastError> {
        if k == 0 {
            return Err(ForecastError::InvalidHorizon {
                h: k,
                max: self.config.max_horizon,
            });
        }
        let steps = self.effective_steps(finetune_steps);
        let n = series.len();
        // Saturates for a caller-supplied k too large to hold out.
        let required = k
            .saturating_mul(3)
            .max(k.saturating_add(min_history(steps)));
        if k > n || n < required {
            return Err(ForecastError::InsufficientHistory {
                required,
                available: n,
                purpose: format!("hold-out evaluation of {} points", k),
            });
        }
        series_cadence(series)?;

        let (train, test) = series.split_tail(k);
        let model = HoltModel::fit(&train.values(), steps)?;
        let predicted = model.predict(k)?;
        let actual: Vec<f64> = test.iter().map(|p| p.value).collect();
        Ok(compute_kpis(&actual, &predicted))
    }

    /// Forecast `h` periods ahead, with embedded hold-out KPIs and insights.
    pub fn forecast(
        &self,
        series: &ForecastSeries,
        h: usize,
        finetune_steps: usize,
    ) -> Result<ForecastResult, ForecastError> {
        self.check_horizon(h)?;
        let steps = self.effective_steps(finetune_steps);
        let cadence_days = series_cadence(series)?;
        let last_date = match series.last_date() {
            Some(date) => date,
            None => {
                return Err(ForecastError::InsufficientHistory {
                    required: min_history(steps),
                    available: 0,
                    purpose: "model fit".to_string(),
                })
            }
        };

        let model = HoltModel::fit(&series.values(), steps)?;
        let forecast: Vec<ForecastPoint> = future_dates(last_date, cadence_days, h)?
            .into_iter()
            .zip(model.predict(h)?)
            .map(|(date, value)| ForecastPoint { date, value })
            .collect();

        let k = h.min(self.config.holdout);
        let kpis = match self.holdout_kpis(series, k, steps) {
            Ok(kpis) => KpiOutcome::Computed { kpis, holdout: k },
            Err(e) => {
                log::debug!("Hold-out KPIs unavailable for {}: {}", series.unique_id, e);
                KpiOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        let mape = kpis.kpis().and_then(|k| k.mape_pct);
        let ctx = InsightContext::new(series, &forecast, mape, &self.config);
        let insights = generate_insights(&ctx);

        Ok(ForecastResult {
            unique_id: series.unique_id.clone(),
            history: series.points.clone(),
            forecast,
            kpis,
            insights,
            model: ModelSummary {
                method: "holt_linear".to_string(),
                alpha: model.params.alpha,
                beta: model.params.beta,
                cadence_days,
                finetune_steps: steps,
                training_sse: model.sse,
            },
        })
    }

    /// Hold-out KPIs plus the last value and recent average of a series.
    pub fn kpi_report(
        &self,
        series: &ForecastSeries,
        k: Option<usize>,
        finetune_steps: usize,
    ) -> KpiReport {
        let k = k.unwrap_or(self.config.holdout);
        let kpis = match self.holdout_kpis(series, k, finetune_steps) {
            Ok(kpis) => KpiOutcome::Computed { kpis, holdout: k },
            Err(e) => KpiOutcome::Unavailable {
                reason: e.to_string(),
            },
        };
        let values = series.values();
        let recent = &values[values.len().saturating_sub(LEVEL_WINDOW)..];
        KpiReport {
            unique_id: series.unique_id.clone(),
            kpis,
            last_period_cases: values.last().copied().unwrap_or(0.0),
            avg_last_12_periods: stats::mean(recent).unwrap_or(0.0),
        }
    }
}

/// Run a fit on the blocking pool, bounded by `limit`.
///
/// On timeout the fit keeps running to completion on its blocking thread but
/// its result is dropped; fits share no state with the caller.
pub async fn run_fit<T, F>(limit: Duration, fit: F) -> Result<T, ForecastError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ForecastError> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(fit);

    match tokio::time::timeout(limit, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(ForecastError::fit_failed(format!("Task join error: {}", e))),
        Err(_) => {
            log::warn!("Forecast fit exceeded {:?} timeout", limit);
            Err(ForecastError::Timeout(limit.as_secs()))
        }
    }
}

/// Run [`ForecastPipeline::forecast`] on the blocking pool, bounded by the
/// configured timeout.
pub async fn forecast_with_timeout(
    pipeline: ForecastPipeline,
    series: ForecastSeries,
    h: usize,
    finetune_steps: usize,
) -> Result<ForecastResult, ForecastError> {
    let limit = Duration::from_secs(pipeline.config.timeout_secs);
    run_fit(limit, move || pipeline.forecast(&series, h, finetune_steps)).await
}

/// Run [`ForecastPipeline::kpi_report`] on the blocking pool, bounded by the
/// configured timeout.
pub async fn kpi_report_with_timeout(
    pipeline: ForecastPipeline,
    series: ForecastSeries,
    k: Option<usize>,
    finetune_steps: usize,
) -> Result<KpiReport, ForecastError> {
    let limit = Duration::from_secs(pipeline.config.timeout_secs);
    run_fit(limit, move || Ok(pipeline.kpi_report(&series, k, finetune_steps))).await
}

#[cfg(test)]
#[path = "forecast_tests.rs"]
mod forecast_tests;
