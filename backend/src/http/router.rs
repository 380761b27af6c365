//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Snapshot bodies are small; anything larger is a client mistake.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Districts and metrics
        .route("/districts", get(handlers::list_districts))
        .route("/districts/{district}/metrics", get(handlers::get_district_metrics))
        .route("/districts/{district}/snapshot", put(handlers::put_district_snapshot))
        .route("/metrics/all", get(handlers::get_all_metrics))
        .route("/metrics/compare", get(handlers::compare_districts))
        // Chatbot
        .route("/chatbot/query", post(handlers::chatbot_query))
        // Forecasting
        .route("/forecast", post(handlers::forecast))
        .route("/forecast/series", get(handlers::list_series))
        .route("/forecast/series/{unique_id}", get(handlers::get_series_data))
        .route("/forecast/kpis", get(handlers::get_series_kpis))
        .route("/forecast/jobs", post(handlers::create_forecast_job))
        // Job management
        .route("/jobs/{job_id}", get(handlers::get_job_status))
        .route("/jobs/{job_id}/logs", get(handlers::stream_job_logs))
        // Case statistics
        .route("/cases/overall-stats", get(handlers::get_overall_stats))
        .route("/cases/disease-distribution", get(handlers::get_disease_distribution))
        .route("/cases/ward-analysis", get(handlers::get_ward_analysis))
        .route("/cases/time-trends", get(handlers::get_time_trends))
        .route("/cases/correlations", get(handlers::get_correlations))
        // Dashboard
        .route("/dashboard/metrics", get(handlers::get_dashboard_metrics))
        .route("/alerts", get(handlers::list_alerts))
        .route("/feedback", get(handlers::list_feedback))
        .route("/sentiment", get(handlers::get_sentiment))
        // Tickets
        .route("/tickets", get(handlers::list_tickets))
        .route("/tickets/filters", get(handlers::get_ticket_filters))
        .route("/tickets/stats", get(handlers::get_ticket_stats))
        // Workforce
        .route("/workforce/summary", get(handlers::get_capacity_summary))
        .route("/workforce/districts", get(handlers::list_workforce_districts))
        .route("/workforce/district/{district}", get(handlers::get_district_capacity))
        .route("/workforce/metrics", get(handlers::get_capacity_metrics))
        .route(
            "/workforce/district-summary",
            get(handlers::get_district_workforce_summary),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
