//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer in `crate::db::services` for business logic.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;

use super::dto::{
    AlertList, AllDistrictMetrics, CapacityMetrics, CapacitySummary, ChatbotRequest, CompareData,
    CompareQuery, CorrelationAnalysis, CreateJobResponse, DashboardMetrics, DiseaseDistribution,
    DistrictCapacity, DistrictList, DistrictMetricsData, DistrictOperationalSnapshot,
    DistrictWorkforceSummary, FeedbackList, ForecastRequest, ForecastResult, HealthResponse,
    JobStatusResponse, KpiQuery, KpiReport, OverallStats, QueryResponse, SentimentData,
    SeriesData, SeriesList, SeriesQuery, SeverityStatusQuery, SnapshotUpdateResponse,
    TicketFilterOptions, TicketList, TicketQuery, TicketStats, TimeTrends, TrendQuery,
    WardAnalysis, WardQuery,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::services::forecast_jobs::{run_forecast_job, ForecastJobRequest};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Interval between polls of a job's log while streaming.
const JOB_POLL_INTERVAL: Duration = Duration::from_millis(200);

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the repository is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Districts and metrics
// =============================================================================

/// GET /v1/districts
pub async fn list_districts(State(state): State<AppState>) -> HandlerResult<DistrictList> {
    let districts = db_services::list_districts(state.repository.as_ref()).await?;
    Ok(Json(DistrictList { districts }))
}

/// GET /v1/districts/{district}/metrics
///
/// Metrics of one district, recomputed only when its data version moved.
pub async fn get_district_metrics(
    State(state): State<AppState>,
    Path(district): Path<String>,
) -> HandlerResult<DistrictMetricsData> {
    let data = db_services::metrics_for_district(
        state.repository.as_ref(),
        &state.engine,
        &state.cache,
        &district,
    )
    .await?;
    Ok(Json(data))
}

/// PUT /v1/districts/{district}/snapshot
///
/// Store a fresh snapshot for a district. The district in the path wins; a
/// body naming a different district is rejected.
pub async fn put_district_snapshot(
    State(state): State<AppState>,
    Path(district): Path<String>,
    Json(mut snapshot): Json<DistrictOperationalSnapshot>,
) -> HandlerResult<SnapshotUpdateResponse> {
    let body_district = snapshot.district.trim();
    if body_district.is_empty() {
        snapshot.district = district.clone();
    } else if !body_district.eq_ignore_ascii_case(district.trim()) {
        return Err(AppError::BadRequest(format!(
            "Snapshot is for '{}' but was sent to '{}'",
            body_district, district
        )));
    }

    let outcome =
        db_services::upsert_snapshot(state.repository.as_ref(), &state.cache, snapshot).await?;
    tracing::info!(
        "Snapshot upsert for {} -> version {} (changed: {})",
        outcome.district,
        outcome.version.value(),
        outcome.changed
    );
    Ok(Json(outcome.into()))
}

/// GET /v1/metrics/all
pub async fn get_all_metrics(State(state): State<AppState>) -> HandlerResult<AllDistrictMetrics> {
    let data = db_services::all_metrics(state.repository.as_ref(), &state.engine).await?;
    if data.failed > 0 {
        tracing::warn!("{} of {} districts failed to score", data.failed, data.total);
    }
    Ok(Json(data))
}

/// GET /v1/metrics/compare?a=&b=
pub async fn compare_districts(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> HandlerResult<CompareData> {
    let data = db_services::compare_districts(
        state.repository.as_ref(),
        &state.engine,
        &state.cache,
        &query.a,
        &query.b,
    )
    .await?;
    Ok(Json(data))
}

// =============================================================================
// Chatbot
// =============================================================================

/// POST /v1/chatbot/query
pub async fn chatbot_query(
    State(state): State<AppState>,
    Json(request): Json<ChatbotRequest>,
) -> HandlerResult<QueryResponse> {
    if request.query.trim().is_empty() {
        return Err(AppError::BadRequest("Query must not be empty".to_string()));
    }

    let response = db_services::chatbot_query(
        state.repository.as_ref(),
        &state.engine,
        &request.query,
        request.district_filter.as_deref(),
    )
    .await?;
    tracing::info!(
        "Chatbot query routed as {:?} (district: {:?})",
        response.query_type,
        response.detected_district
    );
    Ok(Json(response))
}

// =============================================================================
// Forecasting
// =============================================================================

/// GET /v1/forecast/series
pub async fn list_series(State(state): State<AppState>) -> HandlerResult<SeriesList> {
    let series = db_services::list_series(state.repository.as_ref()).await?;
    Ok(Json(SeriesList { series }))
}

/// GET /v1/forecast/series/{unique_id}?n=
pub async fn get_series_data(
    State(state): State<AppState>,
    Path(unique_id): Path<String>,
    Query(query): Query<SeriesQuery>,
) -> HandlerResult<SeriesData> {
    let data = db_services::series_data(state.repository.as_ref(), &unique_id, query.n).await?;
    Ok(Json(data))
}

/// POST /v1/forecast
///
/// Fit and forecast in one request, bounded by the configured timeout.
pub async fn forecast(
    State(state): State<AppState>,
    Json(request): Json<ForecastRequest>,
) -> HandlerResult<ForecastResult> {
    let result = db_services::forecast_series(
        state.repository.as_ref(),
        &state.pipeline,
        &request.unique_id,
        request.h,
        request.finetune_steps,
    )
    .await?;
    Ok(Json(result))
}

/// GET /v1/forecast/kpis?unique_id=&k=&finetune_steps=
pub async fn get_series_kpis(
    State(state): State<AppState>,
    Query(query): Query<KpiQuery>,
) -> HandlerResult<KpiReport> {
    let report = db_services::kpi_report(
        state.repository.as_ref(),
        &state.pipeline,
        &query.unique_id,
        query.k,
        query.finetune_steps,
    )
    .await?;
    Ok(Json(report))
}

/// POST /v1/forecast/jobs
///
/// Start a forecast in the background. Returns a job ID for tracking progress.
pub async fn create_forecast_job(
    State(state): State<AppState>,
    Json(request): Json<ForecastRequest>,
) -> Result<(StatusCode, Json<CreateJobResponse>), AppError> {
    state.pipeline.check_horizon(request.h)?;

    let job_id = state.job_tracker.create_job(request.unique_id.clone());
    let response_job_id = job_id.clone();

    let tracker = state.job_tracker.clone();
    let repo = state.repository.clone();
    let pipeline = state.pipeline.clone();
    let job_request = ForecastJobRequest {
        unique_id: request.unique_id,
        h: request.h,
        finetune_steps: request.finetune_steps,
    };

    tokio::spawn(async move {
        let _ = run_forecast_job(job_id, tracker, repo, pipeline, job_request).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateJobResponse {
            job_id: response_job_id.clone(),
            message: format!(
                "Forecast started. Track progress at /v1/jobs/{}/logs",
                response_job_id
            ),
        }),
    ))
}

// =============================================================================
// Case statistics
// =============================================================================

/// GET /v1/cases/overall-stats
pub async fn get_overall_stats(State(state): State<AppState>) -> HandlerResult<OverallStats> {
    Ok(Json(
        db_services::overall_stats(state.repository.as_ref()).await?,
    ))
}

/// GET /v1/cases/disease-distribution
pub async fn get_disease_distribution(
    State(state): State<AppState>,
) -> HandlerResult<DiseaseDistribution> {
    Ok(Json(
        db_services::disease_distribution(state.repository.as_ref()).await?,
    ))
}

/// GET /v1/cases/ward-analysis?top_n=
pub async fn get_ward_analysis(
    State(state): State<AppState>,
    Query(query): Query<WardQuery>,
) -> HandlerResult<WardAnalysis> {
    Ok(Json(
        db_services::ward_analysis(state.repository.as_ref(), query.top_n).await?,
    ))
}

/// GET /v1/cases/time-trends?period=weekly|monthly
pub async fn get_time_trends(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> HandlerResult<TimeTrends> {
    Ok(Json(
        db_services::time_trends(state.repository.as_ref(), query.period).await?,
    ))
}

/// GET /v1/cases/correlations
pub async fn get_correlations(
    State(state): State<AppState>,
) -> HandlerResult<CorrelationAnalysis> {
    Ok(Json(
        db_services::correlations(state.repository.as_ref()).await?,
    ))
}

// =============================================================================
// Dashboard
// =============================================================================

/// GET /v1/dashboard/metrics
pub async fn get_dashboard_metrics(
    State(state): State<AppState>,
) -> HandlerResult<DashboardMetrics> {
    Ok(Json(
        db_services::dashboard_metrics(state.repository.as_ref()).await?,
    ))
}

/// GET /v1/alerts?severity=&status=
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<SeverityStatusQuery>,
) -> HandlerResult<AlertList> {
    let alerts = db_services::list_alerts(
        state.repository.as_ref(),
        query.severity.as_deref(),
        query.status.as_deref(),
    )
    .await?;
    Ok(Json(alerts))
}

/// GET /v1/feedback?severity=&status=
pub async fn list_feedback(
    State(state): State<AppState>,
    Query(query): Query<SeverityStatusQuery>,
) -> HandlerResult<FeedbackList> {
    let feedback = db_services::list_feedback(
        state.repository.as_ref(),
        query.severity.as_deref(),
        query.status.as_deref(),
    )
    .await?;
    Ok(Json(feedback))
}

/// GET /v1/sentiment
pub async fn get_sentiment(State(state): State<AppState>) -> HandlerResult<SentimentData> {
    Ok(Json(
        db_services::sentiment(state.repository.as_ref()).await?,
    ))
}

// =============================================================================
// Tickets
// =============================================================================

/// GET /v1/tickets
pub async fn list_tickets(
    State(state): State<AppState>,
    Query(query): Query<TicketQuery>,
) -> HandlerResult<TicketList> {
    let tickets =
        db_services::list_tickets(state.repository.as_ref(), &query.filter(), query.limit).await?;
    Ok(Json(tickets))
}

/// GET /v1/tickets/filters
pub async fn get_ticket_filters(
    State(state): State<AppState>,
) -> HandlerResult<TicketFilterOptions> {
    Ok(Json(
        db_services::ticket_filters(state.repository.as_ref()).await?,
    ))
}

/// GET /v1/tickets/stats
pub async fn get_ticket_stats(State(state): State<AppState>) -> HandlerResult<TicketStats> {
    Ok(Json(
        db_services::ticket_stats(state.repository.as_ref()).await?,
    ))
}

// =============================================================================
// Workforce
// =============================================================================

/// GET /v1/workforce/summary
pub async fn get_capacity_summary(
    State(state): State<AppState>,
) -> HandlerResult<CapacitySummary> {
    Ok(Json(
        db_services::capacity_summary(state.repository.as_ref()).await?,
    ))
}

/// GET /v1/workforce/districts
pub async fn list_workforce_districts(
    State(state): State<AppState>,
) -> HandlerResult<DistrictList> {
    let districts = db_services::workforce_districts(state.repository.as_ref()).await?;
    Ok(Json(DistrictList { districts }))
}

/// GET /v1/workforce/district/{district}
pub async fn get_district_capacity(
    State(state): State<AppState>,
    Path(district): Path<String>,
) -> HandlerResult<DistrictCapacity> {
    Ok(Json(
        db_services::district_capacity(state.repository.as_ref(), &district).await?,
    ))
}

/// GET /v1/workforce/metrics
pub async fn get_capacity_metrics(
    State(state): State<AppState>,
) -> HandlerResult<CapacityMetrics> {
    Ok(Json(
        db_services::capacity_metrics(state.repository.as_ref()).await?,
    ))
}

/// GET /v1/workforce/district-summary
pub async fn get_district_workforce_summary(
    State(state): State<AppState>,
) -> HandlerResult<DistrictWorkforceSummary> {
    Ok(Json(
        db_services::district_workforce_summary(state.repository.as_ref()).await?,
    ))
}

// =============================================================================
// Async Job Management
// =============================================================================

/// GET /v1/jobs/{job_id}
///
/// Get the current status and logs of a background job.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> HandlerResult<JobStatusResponse> {
    let job = state
        .job_tracker
        .get_job(&job_id)
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))?;

    Ok(Json(job.into()))
}

/// GET /v1/jobs/{job_id}/logs
///
/// Stream job logs via Server-Sent Events (SSE).
pub async fn stream_job_logs(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if state.job_tracker.get_job(&job_id).is_none() {
        return Err(AppError::NotFound(format!("Job {} not found", job_id)));
    }

    let tracker = state.job_tracker.clone();
    let stream = async_stream::stream! {
        let mut sent = 0;
        loop {
            let logs = tracker.get_logs(&job_id);
            for log in logs.iter().skip(sent) {
                let event_data = serde_json::to_string(log).unwrap_or_default();
                yield Ok(Event::default().data(event_data));
            }
            sent = logs.len();

            match tracker.get_job(&job_id) {
                Some(job) if job.is_finished() => {
                    let final_event = serde_json::json!({
                        "status": job.status,
                        "result": job.result,
                    });
                    yield Ok(Event::default()
                        .event("complete")
                        .data(serde_json::to_string(&final_event).unwrap_or_default()));
                    break;
                }
                Some(_) => {}
                None => break,
            }

            tokio::time::sleep(JOB_POLL_INTERVAL).await;
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}
