use serde::{Deserialize, Serialize};

use crate::models::{Alert, FeedbackItem};

// =========================================================
// Dashboard types + route
// =========================================================

/// Headline counters of the administrator dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    /// Alerts whose status is "Active".
    pub active_alerts: usize,
    /// Active alerts with CRITICAL severity.
    pub critical_issues: usize,
    /// Citizen service logs and social mentions in the reporting window.
    pub total_feedback: u32,
    pub positive_sentiment: String,
    pub alerts_count: usize,
    pub feedback_count: usize,
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertList {
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackList {
    pub feedback: Vec<FeedbackItem>,
}

pub const GET_DASHBOARD_METRICS: &str = "get_dashboard_metrics";
pub const LIST_ALERTS: &str = "list_alerts";
pub const LIST_FEEDBACK: &str = "list_feedback";
pub const GET_SENTIMENT: &str = "get_sentiment";
