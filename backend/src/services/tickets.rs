//! Service-ticket monitoring: filtered listings, filter options and counters.

use std::collections::BTreeSet;

use crate::api::{ServiceTicket, TicketFilter, TicketFilterOptions, TicketList, TicketStats};
use crate::services::stats;

pub const DEFAULT_TICKET_LIMIT: usize = 100;
const OPEN_STATUSES: &[&str] = &["Open", "In Progress", "Pending"];
const HIGH_PRIORITY: &str = "High";
const FILTER_ALL: &str = "All";

fn criterion(filter: &Option<String>) -> Option<&str> {
    filter
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty() && *f != FILTER_ALL)
}

impl TicketFilter {
    /// Exact match on every set criterion.
    pub fn matches(&self, ticket: &ServiceTicket) -> bool {
        [
            (criterion(&self.service_category), ticket.service_category.as_str()),
            (criterion(&self.status), ticket.status.as_str()),
            (criterion(&self.priority), ticket.priority.as_str()),
            (criterion(&self.district), ticket.district.as_str()),
        ]
        .iter()
        .all(|(wanted, actual)| wanted.map_or(true, |w| w == *actual))
    }
}

/// Open, in progress or pending.
pub(crate) fn is_open(ticket: &ServiceTicket) -> bool {
    OPEN_STATUSES.contains(&ticket.status.as_str())
}

/// Matching tickets, newest first, at most `limit` of them.
pub fn list_tickets(tickets: &[ServiceTicket], filter: &TicketFilter, limit: usize) -> TicketList {
    let mut matching: Vec<ServiceTicket> =
        tickets.iter().filter(|t| filter.matches(t)).cloned().collect();
    matching.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.request_id.cmp(&b.request_id))
    });
    matching.truncate(limit);
    TicketList {
        count: matching.len(),
        tickets: matching,
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn ticket_filters(tickets: &[ServiceTicket]) -> TicketFilterOptions {
    TicketFilterOptions {
        service_categories: distinct(tickets.iter().map(|t| t.service_category.as_str())),
        statuses: distinct(tickets.iter().map(|t| t.status.as_str())),
        priorities: distinct(tickets.iter().map(|t| t.priority.as_str())),
        districts: distinct(tickets.iter().map(|t| t.district.as_str())),
    }
}

pub fn ticket_stats(tickets: &[ServiceTicket]) -> TicketStats {
    let resolution: Vec<f64> = tickets
        .iter()
        .filter_map(|t| t.resolution_time_hours)
        .filter(|h| h.is_finite())
        .collect();

    TicketStats {
        total_tickets: tickets.len(),
        open_tickets: tickets.iter().filter(|t| is_open(t)).count(),
        high_priority_tickets: tickets
            .iter()
            .filter(|t| is_open(t) && t.priority == HIGH_PRIORITY)
            .count(),
        average_resolution_hours: stats::mean(&resolution).map(stats::round2).unwrap_or(0.0),
        escalated_tickets: tickets.iter().filter(|t| t.escalated).count(),
    }
}
