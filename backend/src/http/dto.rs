//! Data Transfer Objects for the HTTP API.
//!
//! Response payloads are the `crate::api` types; this module only adds the
//! request bodies, query strings and the few envelopes owned by the HTTP layer.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    AlertList, AllDistrictMetrics, CapacityMetrics, CapacitySummary, CompareData,
    CorrelationAnalysis, DashboardMetrics, DiseaseDistribution, DistrictCapacity, DistrictList,
    DistrictMetricsData, DistrictOperationalSnapshot, DistrictWorkforceSummary, FeedbackList,
    ForecastResult, KpiReport, OverallStats, QueryResponse, SentimentData, SeriesData, SeriesList,
    TicketFilter, TicketFilterOptions, TicketList, TicketStats, TimeTrends, TrendPeriod,
    WardAnalysis,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Repository status
    pub database: String,
}

/// Query parameters for the compare endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareQuery {
    pub a: String,
    pub b: String,
}

/// Request body for the chatbot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotRequest {
    pub query: String,
    /// Restrict the answer to one district
    #[serde(default)]
    pub district_filter: Option<String>,
}

/// Request body for a forecast, synchronous or as a background job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub unique_id: String,
    /// Periods to forecast
    #[serde(default = "default_horizon")]
    pub h: usize,
    /// Fine-tuning passes over the smoothing parameters (0 keeps the defaults)
    #[serde(default)]
    pub finetune_steps: usize,
}

fn default_horizon() -> usize {
    12
}

/// Query parameters for the KPI endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiQuery {
    pub unique_id: String,
    /// Hold-out length (defaults to the configured value)
    #[serde(default)]
    pub k: Option<usize>,
    #[serde(default)]
    pub finetune_steps: usize,
}

/// Query parameters for series data.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SeriesQuery {
    /// Return only the last `n` points
    #[serde(default)]
    pub n: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WardQuery {
    #[serde(default)]
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrendQuery {
    #[serde(default)]
    pub period: TrendPeriod,
}

/// Severity/status filters shared by alerts and feedback. "All" or absent
/// means no filter.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SeverityStatusQuery {
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Query parameters for the ticket list.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TicketQuery {
    #[serde(default)]
    pub service_category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl TicketQuery {
    pub fn filter(&self) -> TicketFilter {
        TicketFilter {
            service_category: self.service_category.clone(),
            status: self.status.clone(),
            priority: self.priority.clone(),
            district: self.district.clone(),
        }
    }
}

/// Response for job creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobResponse {
    /// Job ID for tracking the async processing
    pub job_id: String,
    /// Message about the operation
    pub message: String,
}

/// Job status response for async processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    /// Job ID
    pub job_id: String,
    pub label: String,
    /// Job status
    pub status: crate::services::job_tracker::JobStatus,
    /// Log entries
    pub logs: Vec<crate::services::job_tracker::LogEntry>,
    /// Result if completed
    pub result: Option<serde_json::Value>,
}

impl From<crate::services::job_tracker::Job> for JobStatusResponse {
    fn from(job: crate::services::job_tracker::Job) -> Self {
        Self {
            job_id: job.job_id,
            label: job.label,
            status: job.status,
            logs: job.logs,
            result: job.result,
        }
    }
}

/// Result of a snapshot upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotUpdateResponse {
    pub district: String,
    pub data_version: u64,
    /// False when the stored snapshot was already identical
    pub changed: bool,
}

impl From<crate::db::repository::UpsertOutcome> for SnapshotUpdateResponse {
    fn from(outcome: crate::db::repository::UpsertOutcome) -> Self {
        Self {
            district: outcome.district,
            data_version: outcome.version.value(),
            changed: outcome.changed,
        }
    }
}
