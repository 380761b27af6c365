//! Service layer for business logic.
//!
//! Pure computations over records already loaded from the repository: the
//! metric engine, aggregation views, forecasting and the chatbot router, plus
//! the dashboard, ticket and workforce summaries. Database orchestration lives
//! in `crate::db::services`.

pub mod aggregate;
pub mod case_stats;
pub mod chatbot;
pub mod dashboard;
pub mod forecast;
pub mod insights;
pub mod metric_cache;
pub mod metrics;
pub mod query_router;
pub mod rules;
pub mod stats;
pub mod tickets;
pub mod workforce;

#[cfg(feature = "http-server")]
pub mod forecast_jobs;
#[cfg(feature = "http-server")]
pub mod job_tracker;

pub use aggregate::{compare, compute_all, AggregationError};
pub use chatbot::route_query;
pub use forecast::{ForecastError, ForecastPipeline};
pub use metric_cache::MetricCache;
pub use metrics::{compute_metrics, MetricEngine};
