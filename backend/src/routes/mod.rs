pub mod cases;
pub mod chatbot;
pub mod dashboard;
pub mod forecast;
pub mod metrics;
pub mod tickets;
pub mod workforce;

#[cfg(test)]
mod tests {
    #[test]
    fn test_module_structure() {
        // Test that all route module constants are accessible
        assert_eq!(
            super::metrics::GET_DISTRICT_METRICS,
            "get_district_metrics"
        );
        assert_eq!(super::metrics::GET_ALL_METRICS, "get_all_metrics");
        assert_eq!(super::metrics::COMPARE_DISTRICTS, "compare_districts");
        assert_eq!(super::chatbot::CHATBOT_QUERY, "chatbot_query");
        assert_eq!(super::chatbot::LIST_DISTRICTS, "list_districts");
        assert_eq!(super::forecast::FORECAST_SERIES, "forecast_series");
        assert_eq!(super::cases::GET_OVERALL_STATS, "get_overall_stats");
        assert_eq!(super::cases::GET_TIME_TRENDS, "get_time_trends");
        assert_eq!(super::cases::GET_CORRELATIONS, "get_correlations");
        assert_eq!(
            super::dashboard::GET_DASHBOARD_METRICS,
            "get_dashboard_metrics"
        );
        assert_eq!(super::dashboard::LIST_ALERTS, "list_alerts");
        assert_eq!(super::dashboard::LIST_FEEDBACK, "list_feedback");
        assert_eq!(super::dashboard::GET_SENTIMENT, "get_sentiment");
        assert_eq!(super::tickets::LIST_TICKETS, "list_tickets");
        assert_eq!(super::tickets::GET_TICKET_FILTERS, "get_ticket_filters");
        assert_eq!(super::tickets::GET_TICKET_STATS, "get_ticket_stats");
        assert_eq!(
            super::workforce::GET_CAPACITY_SUMMARY,
            "get_capacity_summary"
        );
        assert_eq!(
            super::workforce::GET_DISTRICT_CAPACITY,
            "get_district_capacity"
        );
        assert_eq!(
            super::workforce::LIST_WORKFORCE_DISTRICTS,
            "list_workforce_districts"
        );
        assert_eq!(
            super::workforce::GET_CAPACITY_METRICS,
            "get_capacity_metrics"
        );
        assert_eq!(
            super::workforce::GET_DISTRICT_WORKFORCE_SUMMARY,
            "get_district_workforce_summary"
        );
    }
}
