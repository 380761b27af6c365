//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::AnalyticsConfig;
use crate::db::repository::FullRepository;
use crate::services::forecast::ForecastPipeline;
use crate::services::job_tracker::JobTracker;
use crate::services::metric_cache::MetricCache;
use crate::services::metrics::MetricEngine;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for record access
    pub repository: Arc<dyn FullRepository>,
    /// Metric engine built from the analytics configuration
    pub engine: Arc<MetricEngine>,
    pub pipeline: ForecastPipeline,
    /// Per-district metrics keyed by data version
    pub cache: Arc<MetricCache>,
    /// Background forecast jobs
    pub job_tracker: JobTracker,
    pub config: Arc<AnalyticsConfig>,
}

impl AppState {
    /// Create a new application state with the default analytics configuration.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self::with_config(repository, AnalyticsConfig::default())
    }

    /// Create a new application state from a loaded analytics configuration.
    pub fn with_config(repository: Arc<dyn FullRepository>, config: AnalyticsConfig) -> Self {
        Self {
            repository,
            engine: Arc::new(MetricEngine::new(&config)),
            pipeline: ForecastPipeline::new(config.forecast.clone()),
            cache: Arc::new(MetricCache::new()),
            job_tracker: JobTracker::new(),
            config: Arc::new(config),
        }
    }
}
