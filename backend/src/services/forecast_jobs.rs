//! Background forecast jobs.
//!
//! Runs a forecast as a tracked job so clients can follow progress over SSE
//! instead of holding a request open for the whole fit.

use std::sync::Arc;

use crate::api::ForecastResult;
use crate::db::repository::FullRepository;
use crate::db::services as db_services;
use crate::services::forecast::{forecast_with_timeout, ForecastPipeline};
use crate::services::job_tracker::{JobTracker, LogLevel};

/// Parameters of one background forecast.
#[derive(Debug, Clone)]
pub struct ForecastJobRequest {
    pub unique_id: String,
    pub h: usize,
    pub finetune_steps: usize,
}

/// Load the series, fit and forecast, logging each stage to the tracker.
///
/// Designed to be spawned; the job ends completed with the serialized
/// [`ForecastResult`] or failed with the reason as its last log entry.
pub async fn run_forecast_job(
    job_id: String,
    tracker: JobTracker,
    repo: Arc<dyn FullRepository>,
    pipeline: ForecastPipeline,
    request: ForecastJobRequest,
) -> Result<ForecastResult, String> {
    tracker.log(
        &job_id,
        LogLevel::Info,
        format!("Loading series {}...", request.unique_id),
    );

    let series = match db_services::load_series(repo.as_ref(), &request.unique_id).await {
        Ok(series) => {
            tracker.log(
                &job_id,
                LogLevel::Success,
                format!("✓ Loaded {} observations", series.len()),
            );
            series
        }
        Err(e) => {
            let msg = format!("Failed to load series: {}", e);
            tracker.fail_job(&job_id, &msg);
            return Err(msg);
        }
    };

    if request.finetune_steps > pipeline.config().max_finetune_steps {
        tracker.log(
            &job_id,
            LogLevel::Warning,
            format!(
                "Fine-tuning capped at {} steps (requested {})",
                pipeline.config().max_finetune_steps,
                request.finetune_steps
            ),
        );
    }

    tracker.log(
        &job_id,
        LogLevel::Info,
        format!("Fitting model and forecasting {} periods...", request.h),
    );
    let result = match forecast_with_timeout(pipeline, series, request.h, request.finetune_steps)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            let msg = format!("Forecast failed: {}", e);
            tracker.fail_job(&job_id, &msg);
            return Err(msg);
        }
    };

    tracker.log(
        &job_id,
        LogLevel::Success,
        format!(
            "✓ Forecast ready: {} points (alpha={:.2}, beta={:.2})",
            result.forecast.len(),
            result.model.alpha,
            result.model.beta
        ),
    );
    match result.kpis.kpis() {
        Some(kpis) => tracker.log(
            &job_id,
            LogLevel::Success,
            format!("✓ Hold-out MAE {:.2}, RMSE {:.2}", kpis.mae, kpis.rmse),
        ),
        None => tracker.log(&job_id, LogLevel::Warning, "Hold-out KPIs unavailable"),
    }

    match serde_json::to_value(&result) {
        Ok(value) => {
            tracker.complete_job(&job_id, Some(value));
            Ok(result)
        }
        Err(e) => {
            let msg = format!("Failed to serialize forecast: {}", e);
            tracker.fail_job(&job_id, &msg);
            Err(msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RepositoryFactory;
    use crate::services::job_tracker::JobStatus;

    #[tokio::test]
    async fn test_job_completes_with_result() {
        let tracker = JobTracker::new();
        let repo = RepositoryFactory::create_local().unwrap();
        let job_id = tracker.create_job("W01__Dengue");

        let result = run_forecast_job(
            job_id.clone(),
            tracker.clone(),
            repo,
            ForecastPipeline::default(),
            ForecastJobRequest {
                unique_id: "W01__Dengue".to_string(),
                h: 6,
                finetune_steps: 2,
            },
        )
        .await
        .unwrap();

        assert_eq!(result.forecast.len(), 6);
        let job = tracker.get_job(&job_id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result.unwrap()["unique_id"], "W01__Dengue");
        assert!(job.logs.iter().any(|l| l.level == LogLevel::Success));
    }

    #[tokio::test]
    async fn test_unknown_series_fails_job() {
        let tracker = JobTracker::new();
        let repo = RepositoryFactory::create_local().unwrap();
        let job_id = tracker.create_job("W99__Cholera");

        let err = run_forecast_job(
            job_id.clone(),
            tracker.clone(),
            repo,
            ForecastPipeline::default(),
            ForecastJobRequest {
                unique_id: "W99__Cholera".to_string(),
                h: 4,
                finetune_steps: 0,
            },
        )
        .await
        .unwrap_err();

        assert!(err.contains("Unknown series"));
        let job = tracker.get_job(&job_id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.logs.last().unwrap().level, LogLevel::Error);
    }
}
