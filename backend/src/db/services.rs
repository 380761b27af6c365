//! Service layer: repository reads combined with the analytics services.
//!
//! These are the functions the HTTP handlers call. Each one fetches what it
//! needs from a [`FullRepository`] and hands it to the pure computation in
//! `crate::services`.

use crate::api::{
    AlertList, AllDistrictMetrics, CapacityMetrics, CapacitySummary, CompareData,
    CorrelationAnalysis, DashboardMetrics, DiseaseDistribution, DistrictCapacity,
    DistrictMetricsData, DistrictOperationalSnapshot, DistrictWorkforceSummary, FeedbackList,
    ForecastResult, ForecastSeries, KpiReport, OverallStats, QueryResponse, SentimentData,
    SeriesData, TicketFilter, TicketFilterOptions, TicketList, TicketStats, TimeTrends,
    TrendPeriod, WardAnalysis,
};
use crate::db::repository::{
    CaseRepository, DistrictRepository, FullRepository, OperationsRepository, RepositoryError,
    RepositoryResult, UpsertOutcome,
};
use crate::services::aggregate::{compare_view, compute_all, ranking_view, AggregationError};
use crate::services::forecast::{
    forecast_with_timeout, kpi_report_with_timeout, ForecastError, ForecastPipeline,
};
use crate::services::metric_cache::MetricCache;
use crate::services::metrics::MetricEngine;
use crate::services::{case_stats, chatbot, dashboard, tickets, workforce};

/// Failure of a service-layer call.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Check that the repository is reachable.
pub async fn health_check(repo: &dyn FullRepository) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Districts and metrics ====================

pub async fn list_districts(repo: &dyn FullRepository) -> RepositoryResult<Vec<String>> {
    repo.list_districts().await
}

/// Store a district snapshot and drop its cached metrics when it changed.
pub async fn upsert_snapshot(
    repo: &dyn FullRepository,
    cache: &MetricCache,
    snapshot: DistrictOperationalSnapshot,
) -> RepositoryResult<UpsertOutcome> {
    let outcome = repo.upsert_snapshot(snapshot).await?;
    if outcome.changed {
        cache.invalidate(&outcome.district);
        log::info!(
            "Stored snapshot for {} (data version {})",
            outcome.district,
            outcome.version.value()
        );
    } else {
        log::debug!("Snapshot for {} unchanged", outcome.district);
    }
    Ok(outcome)
}

/// Metrics of one district, served from the cache when its data version has
/// not moved.
///
/// An unknown district fails this request only.
pub async fn metrics_for_district(
    repo: &dyn FullRepository,
    engine: &MetricEngine,
    cache: &MetricCache,
    district: &str,
) -> ServiceResult<DistrictMetricsData> {
    let stored = match repo.get_snapshot(district).await {
        Ok(stored) => stored,
        Err(RepositoryError::NotFound { .. }) => {
            return Err(AggregationError::UnknownDistrict(district.trim().to_string()).into())
        }
        Err(e) => return Err(e.into()),
    };

    let metrics = cache.get_or_compute(&stored.snapshot.district, stored.version, || {
        engine.compute_metrics(&stored.snapshot)
    });
    let top_issues = metrics.top_issues().to_vec();

    Ok(DistrictMetricsData {
        district: stored.snapshot.district.clone(),
        data_version: stored.version.value(),
        metrics,
        top_issues,
    })
}

/// Metrics of every stored district, ranked.
pub async fn all_metrics(
    repo: &dyn FullRepository,
    engine: &MetricEngine,
) -> RepositoryResult<AllDistrictMetrics> {
    let snapshots = repo.list_snapshots().await?;
    Ok(ranking_view(compute_all(engine, &snapshots)))
}

/// Pairwise comparison of two stored districts.
pub async fn compare_districts(
    repo: &dyn FullRepository,
    engine: &MetricEngine,
    cache: &MetricCache,
    a: &str,
    b: &str,
) -> ServiceResult<CompareData> {
    let a = metrics_for_district(repo, engine, cache, a).await?;
    let b = metrics_for_district(repo, engine, cache, b).await?;
    Ok(compare_view(
        &a.metrics,
        &b.metrics,
        engine.thresholds().compare_epsilon,
    ))
}

pub async fn chatbot_query(
    repo: &dyn FullRepository,
    engine: &MetricEngine,
    query: &str,
    district_filter: Option<&str>,
) -> RepositoryResult<QueryResponse> {
    let snapshots = repo.list_snapshots().await?;
    Ok(chatbot::route_query(engine, &snapshots, query, district_filter))
}

// ==================== Case data and forecasts ====================

pub async fn list_series(repo: &dyn FullRepository) -> RepositoryResult<Vec<String>> {
    Ok(case_stats::list_series(&repo.case_records().await?))
}

/// Load one forecast series.
pub async fn load_series(repo: &dyn FullRepository, unique_id: &str) -> ServiceResult<ForecastSeries> {
    let records = repo.series_records(unique_id).await?;
    Ok(case_stats::series(&records, unique_id)?)
}

pub async fn series_data(
    repo: &dyn FullRepository,
    unique_id: &str,
    n: Option<usize>,
) -> ServiceResult<SeriesData> {
    let records = repo.series_records(unique_id).await?;
    Ok(case_stats::series_data(&records, unique_id, n)?)
}

/// Forecast a stored series on the blocking pool, bounded by the configured
/// timeout.
pub async fn forecast_series(
    repo: &dyn FullRepository,
    pipeline: &ForecastPipeline,
    unique_id: &str,
    h: usize,
    finetune_steps: usize,
) -> ServiceResult<ForecastResult> {
    let series = load_series(repo, unique_id).await?;
    log::info!(
        "Forecasting {} ({} points, h={}, finetune_steps={})",
        unique_id,
        series.len(),
        h,
        finetune_steps
    );
    Ok(forecast_with_timeout(pipeline.clone(), series, h, finetune_steps).await?)
}

/// Hold-out KPIs of a stored series, fitted on the blocking pool.
pub async fn kpi_report(
    repo: &dyn FullRepository,
    pipeline: &ForecastPipeline,
    unique_id: &str,
    k: Option<usize>,
    finetune_steps: usize,
) -> ServiceResult<KpiReport> {
    let series = load_series(repo, unique_id).await?;
    Ok(kpi_report_with_timeout(pipeline.clone(), series, k, finetune_steps).await?)
}

pub async fn overall_stats(repo: &dyn FullRepository) -> RepositoryResult<OverallStats> {
    Ok(case_stats::overall_stats(&repo.case_records().await?))
}

pub async fn disease_distribution(
    repo: &dyn FullRepository,
) -> RepositoryResult<DiseaseDistribution> {
    Ok(case_stats::disease_distribution(&repo.case_records().await?))
}

pub async fn ward_analysis(
    repo: &dyn FullRepository,
    top_n: Option<usize>,
) -> RepositoryResult<WardAnalysis> {
    let top_n = top_n.unwrap_or(case_stats::DEFAULT_TOP_WARDS);
    Ok(case_stats::ward_analysis(&repo.case_records().await?, top_n))
}

pub async fn time_trends(
    repo: &dyn FullRepository,
    period: TrendPeriod,
) -> RepositoryResult<TimeTrends> {
    Ok(case_stats::time_trends(&repo.case_records().await?, period))
}

pub async fn correlations(repo: &dyn FullRepository) -> RepositoryResult<CorrelationAnalysis> {
    Ok(case_stats::correlation_analysis(&repo.case_records().await?))
}

// ==================== Dashboard ====================

pub async fn dashboard_metrics(repo: &dyn FullRepository) -> RepositoryResult<DashboardMetrics> {
    let alerts = repo.alerts().await?;
    let feedback = repo.feedback().await?;
    let sentiment = repo.sentiment().await?;
    Ok(dashboard::dashboard_metrics(&alerts, &feedback, &sentiment))
}

pub async fn list_alerts(
    repo: &dyn FullRepository,
    severity: Option<&str>,
    status: Option<&str>,
) -> RepositoryResult<AlertList> {
    Ok(dashboard::list_alerts(&repo.alerts().await?, severity, status))
}

pub async fn list_feedback(
    repo: &dyn FullRepository,
    severity: Option<&str>,
    status: Option<&str>,
) -> RepositoryResult<FeedbackList> {
    Ok(dashboard::list_feedback(
        &repo.feedback().await?,
        severity,
        status,
    ))
}

pub async fn sentiment(repo: &dyn FullRepository) -> RepositoryResult<SentimentData> {
    repo.sentiment().await
}

// ==================== Tickets ====================

pub async fn list_tickets(
    repo: &dyn FullRepository,
    filter: &TicketFilter,
    limit: Option<usize>,
) -> RepositoryResult<TicketList> {
    let limit = limit.unwrap_or(tickets::DEFAULT_TICKET_LIMIT);
    Ok(tickets::list_tickets(&repo.tickets().await?, filter, limit))
}

pub async fn ticket_filters(repo: &dyn FullRepository) -> RepositoryResult<TicketFilterOptions> {
    Ok(tickets::ticket_filters(&repo.tickets().await?))
}

pub async fn ticket_stats(repo: &dyn FullRepository) -> RepositoryResult<TicketStats> {
    Ok(tickets::ticket_stats(&repo.tickets().await?))
}

// ==================== Workforce ====================

pub async fn capacity_summary(repo: &dyn FullRepository) -> RepositoryResult<CapacitySummary> {
    Ok(workforce::capacity_summary(&repo.workforce_rosters().await?))
}

pub async fn district_capacity(
    repo: &dyn FullRepository,
    district: &str,
) -> ServiceResult<DistrictCapacity> {
    let rosters = repo.workforce_rosters().await?;
    Ok(workforce::district_capacity(&rosters, district)?)
}

pub async fn workforce_districts(repo: &dyn FullRepository) -> RepositoryResult<Vec<String>> {
    Ok(workforce::workforce_districts(
        &repo.workforce_rosters().await?,
    ))
}

pub async fn capacity_metrics(repo: &dyn FullRepository) -> RepositoryResult<CapacityMetrics> {
    Ok(workforce::capacity_metrics(&repo.workforce_rosters().await?))
}

/// Per-district workforce table, with open tickets counted as active alerts.
pub async fn district_workforce_summary(
    repo: &dyn FullRepository,
) -> RepositoryResult<DistrictWorkforceSummary> {
    let rosters = repo.workforce_rosters().await?;
    let tickets = repo.tickets().await?;
    Ok(workforce::district_summary(&rosters, &tickets))
}
