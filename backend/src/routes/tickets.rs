use serde::{Deserialize, Serialize};

use crate::models::ServiceTicket;

// =========================================================
// Ticket monitoring types + route
// =========================================================

/// Exact-match ticket filter; `None` (or "All") disables a criterion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TicketFilter {
    #[serde(default)]
    pub service_category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketList {
    pub tickets: Vec<ServiceTicket>,
    pub count: usize,
}

/// Distinct values available to each ticket filter, sorted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TicketFilterOptions {
    pub service_categories: Vec<String>,
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
    pub districts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketStats {
    pub total_tickets: usize,
    /// Open, In Progress or Pending.
    pub open_tickets: usize,
    /// High priority among the open tickets.
    pub high_priority_tickets: usize,
    pub average_resolution_hours: f64,
    pub escalated_tickets: usize,
}

pub const LIST_TICKETS: &str = "list_tickets";
pub const GET_TICKET_FILTERS: &str = "get_ticket_filters";
pub const GET_TICKET_STATS: &str = "get_ticket_stats";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults_to_no_criteria() {
        let filter: TicketFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter, TicketFilter::default());
    }
}
