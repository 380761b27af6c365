//! Operational records served by the dashboard: alerts, citizen feedback,
//! sentiment aggregates, service tickets and workforce rosters.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A system alert raised by one of the monitoring pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub title: String,
    /// CRITICAL, WARNING or INFO.
    pub severity: String,
    pub description: String,
    /// Relative, human readable ("3 hours ago").
    pub timestamp: String,
    /// Active, Acknowledged or Resolved.
    pub status: String,
    pub actionable_intelligence: String,
}

/// A clustered citizen feedback item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: i64,
    pub title: String,
    pub severity: String,
    pub description: String,
    pub timestamp: String,
    pub status: String,
    pub sentiment: String,
    pub insight: String,
}

/// Share of positive/neutral/negative feedback, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub word: String,
    pub frequency: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentTrendPoint {
    pub date: String,
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSentiment {
    pub topic: String,
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

/// Aggregated citizen sentiment for charts and the word cloud.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentData {
    pub sentiment_distribution: SentimentDistribution,
    pub word_frequency: Vec<WordFrequency>,
    pub sentiment_trends: Vec<SentimentTrendPoint>,
    pub topic_sentiment: Vec<TopicSentiment>,
}

/// A citizen service request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTicket {
    pub request_id: String,
    pub created_at: NaiveDateTime,
    pub service_category: String,
    #[serde(default)]
    pub sub_category: Option<String>,
    /// High, Medium or Low.
    pub priority: String,
    pub status: String,
    pub district: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub resolution_time_hours: Option<f64>,
    #[serde(default)]
    pub escalated: bool,
    #[serde(default)]
    pub satisfaction_rating: Option<f64>,
    #[serde(default)]
    pub assigned_department: Option<String>,
    #[serde(default)]
    pub worker_assigned: Option<String>,
}

/// Head-count of one worker role in one district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkforceRoster {
    pub district: String,
    pub role: String,
    pub total: u32,
    pub available: u32,
    pub deployed: u32,
}

impl WorkforceRoster {
    /// Available share of the role in percent (0 when the role is empty).
    pub fn availability_pct(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.available as f64 / self.total as f64 * 100.0
    }
}
