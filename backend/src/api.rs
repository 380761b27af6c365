//! Public API surface for the Rust backend.
//!
//! This file consolidates the DTO types for the HTTP API.
//! All types derive Serialize/Deserialize for JSON serialization.

pub use crate::models::Alert;
pub use crate::models::CaseRecord;
pub use crate::models::DistrictOperationalSnapshot;
pub use crate::models::FeedbackItem;
pub use crate::models::ForecastSeries;
pub use crate::models::SentimentData;
pub use crate::models::SentimentDistribution;
pub use crate::models::SentimentTrendPoint;
pub use crate::models::SeriesPoint;
pub use crate::models::ServiceTicket;
pub use crate::models::SnapshotField;
pub use crate::models::TopicSentiment;
pub use crate::models::WordFrequency;
pub use crate::models::WorkforceRoster;
pub use crate::routes::cases::Correlation;
pub use crate::routes::cases::CorrelationAnalysis;
pub use crate::routes::cases::DateRange;
pub use crate::routes::cases::DiseaseDistribution;
pub use crate::routes::cases::OverallStats;
pub use crate::routes::cases::TimeTrends;
pub use crate::routes::cases::TrendPeriod;
pub use crate::routes::cases::WardAnalysis;
pub use crate::routes::chatbot::Agent;
pub use crate::routes::chatbot::DistrictList;
pub use crate::routes::chatbot::QueryResponse;
pub use crate::routes::chatbot::QueryType;
pub use crate::routes::chatbot::XaiLogEntry;
pub use crate::routes::dashboard::AlertList;
pub use crate::routes::dashboard::DashboardMetrics;
pub use crate::routes::dashboard::FeedbackList;
pub use crate::routes::forecast::ForecastInsights;
pub use crate::routes::forecast::ForecastKpis;
pub use crate::routes::forecast::ForecastPoint;
pub use crate::routes::forecast::ForecastResult;
pub use crate::routes::forecast::KpiOutcome;
pub use crate::routes::forecast::KpiReport;
pub use crate::routes::forecast::ModelSummary;
pub use crate::routes::forecast::SeriesData;
pub use crate::routes::forecast::SeriesList;
pub use crate::routes::metrics::AllDistrictMetrics;
pub use crate::routes::metrics::CompareData;
pub use crate::routes::metrics::ComponentPriority;
pub use crate::routes::metrics::DistrictMetricsData;
pub use crate::routes::metrics::MetricDifference;
pub use crate::routes::metrics::MetricKind;
pub use crate::routes::metrics::MetricResult;
pub use crate::routes::metrics::MetricUnavailable;
pub use crate::routes::metrics::PriorityLevel;
pub use crate::routes::metrics::RankedDistrict;
pub use crate::routes::metrics::ScoreValue;
pub use crate::routes::tickets::TicketFilter;
pub use crate::routes::tickets::TicketFilterOptions;
pub use crate::routes::tickets::TicketList;
pub use crate::routes::tickets::TicketStats;
pub use crate::routes::workforce::CapacityMetrics;
pub use crate::routes::workforce::CapacitySummary;
pub use crate::routes::workforce::DistrictCapacity;
pub use crate::routes::workforce::DistrictWorkforceRow;
pub use crate::routes::workforce::DistrictWorkforceSummary;
pub use crate::routes::workforce::RoleCapacity;

use serde::{Deserialize, Serialize};

/// Monotonic version of a district's stored snapshot.
///
/// Bumped on every upsert that changes the snapshot; used as the second half
/// of the metric cache key.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DataVersion(pub u64);

impl DataVersion {
    pub fn new(value: u64) -> Self {
        DataVersion(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        DataVersion(self.0 + 1)
    }
}
