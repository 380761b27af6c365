use serde::{Deserialize, Serialize};

use super::metrics::MetricResult;

// =========================================================
// Chatbot types + route
// =========================================================

/// Analysis domains a query can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Agent {
    DataRetrieval,
    Health,
    Infrastructure,
    Resource,
}

impl Agent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Agent::DataRetrieval => "data_retrieval",
            Agent::Health => "health",
            Agent::Infrastructure => "infrastructure",
            Agent::Resource => "resource",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Greeting,
    SingleDistrict,
    Comparative,
    MultiDistrict,
    General,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Greeting => "greeting",
            QueryType::SingleDistrict => "single_district",
            QueryType::Comparative => "comparative",
            QueryType::MultiDistrict => "multi_district",
            QueryType::General => "general",
        }
    }
}

/// One step of the routing explanation trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XaiLogEntry {
    pub step: String,
    pub decision: String,
    pub reasoning: String,
}

impl XaiLogEntry {
    pub fn new(
        step: impl Into<String>,
        decision: impl Into<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            step: step.into(),
            decision: decision.into(),
            reasoning: reasoning.into(),
        }
    }
}

/// Answer to a free-text chatbot query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response_text: String,
    pub success: bool,
    pub is_district_specific: bool,
    pub detected_district: Option<String>,
    pub xai_log: Vec<XaiLogEntry>,
    pub query_type: QueryType,
    pub agents: Vec<Agent>,
    /// Metrics of `detected_district`, when district-specific.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricResult>,
}

/// Districts the chatbot can resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictList {
    pub districts: Vec<String>,
}

pub const CHATBOT_QUERY: &str = "chatbot_query";
pub const LIST_DISTRICTS: &str = "list_districts";
