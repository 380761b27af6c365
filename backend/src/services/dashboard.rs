//! Administrator dashboard: alert and feedback listings, sentiment and the
//! headline counters.

use crate::api::{Alert, AlertList, DashboardMetrics, FeedbackItem, FeedbackList, SentimentData};

/// Citizen service logs and social mentions behind the feedback clusters.
pub const TOTAL_FEEDBACK_VOLUME: u32 = 125;

const ACTIVE: &str = "Active";
const CRITICAL: &str = "CRITICAL";
/// Filter value that disables a criterion.
pub const FILTER_ALL: &str = "All";

/// Case-insensitive match; `None`, empty and "All" match everything.
pub fn matches_filter(value: &str, filter: Option<&str>) -> bool {
    match filter.map(str::trim) {
        None => true,
        Some(f) if f.is_empty() || f.eq_ignore_ascii_case(FILTER_ALL) => true,
        Some(f) => value.eq_ignore_ascii_case(f),
    }
}

pub fn list_alerts(alerts: &[Alert], severity: Option<&str>, status: Option<&str>) -> AlertList {
    AlertList {
        alerts: alerts
            .iter()
            .filter(|a| matches_filter(&a.severity, severity) && matches_filter(&a.status, status))
            .cloned()
            .collect(),
    }
}

pub fn list_feedback(
    feedback: &[FeedbackItem],
    severity: Option<&str>,
    status: Option<&str>,
) -> FeedbackList {
    FeedbackList {
        feedback: feedback
            .iter()
            .filter(|f| matches_filter(&f.severity, severity) && matches_filter(&f.status, status))
            .cloned()
            .collect(),
    }
}

/// Headline counters. Positive sentiment is the positive share of the
/// sentiment distribution.
pub fn dashboard_metrics(
    alerts: &[Alert],
    feedback: &[FeedbackItem],
    sentiment: &SentimentData,
) -> DashboardMetrics {
    let active: Vec<&Alert> = alerts.iter().filter(|a| a.status == ACTIVE).collect();
    DashboardMetrics {
        active_alerts: active.len(),
        critical_issues: active.iter().filter(|a| a.severity == CRITICAL).count(),
        total_feedback: TOTAL_FEEDBACK_VOLUME,
        positive_sentiment: format!("{}%", sentiment.sentiment_distribution.positive),
        alerts_count: alerts.len(),
        feedback_count: feedback.len(),
        word_count: sentiment.word_frequency.len(),
    }
}
