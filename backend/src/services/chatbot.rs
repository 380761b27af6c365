//! Chatbot answers: routes a query, runs the metric engine for the districts
//! it names and renders a plain-text reply with the XAI trace attached.

use std::fmt::Write as _;

use crate::api::{
    AllDistrictMetrics, DistrictOperationalSnapshot, MetricDifference, MetricResult,
    QueryResponse, QueryType, ScoreValue, XaiLogEntry,
};
use crate::services::aggregate::{compare, compute_all, find_snapshot, ranking_view};
use crate::services::metrics::MetricEngine;
use crate::services::query_router::{route, RoutingDecision, GREETING_RESPONSE};

/// Recommendations quoted in a single-district answer.
const MAX_QUOTED_RECOMMENDATIONS: usize = 3;
/// Issues quoted in a single-district answer.
const MAX_QUOTED_ISSUES: usize = 3;
/// Districts listed in a ranking answer.
const MAX_RANKED: usize = 5;

/// Sorted names of the districts the chatbot can answer about.
pub fn district_names(snapshots: &[DistrictOperationalSnapshot]) -> Vec<String> {
    let mut names: Vec<String> = snapshots
        .iter()
        .map(|s| s.district.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();
    names.sort_by_key(|d| d.to_lowercase());
    names.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    names
}

fn fmt_score(score: &ScoreValue) -> String {
    match score.value() {
        Some(v) => format!("{:.2}", v),
        None => "unavailable".to_string(),
    }
}

fn render_district(m: &MetricResult) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}: P-Score {}", m.district, fmt_score(&m.p_score));
    if let Some(level) = m.priority_level {
        let _ = write!(out, " ({})", level);
    }
    out.push('\n');
    let _ = writeln!(
        out,
        "HVI {} | ISS {} | RCS {} | SEL {} | Capacity gap {}",
        fmt_score(&m.hvi_score),
        fmt_score(&m.iss_score),
        fmt_score(&m.rcs_score),
        fmt_score(&m.sel_index),
        fmt_score(&m.health_worker_capacity_gap)
    );
    if m.equity_gap {
        out.push_str("Equity gap detected between literacy segments\n");
    }

    if !m.recommendations.is_empty() {
        out.push_str("Top recommendations:\n");
        for (i, rec) in m
            .recommendations
            .iter()
            .take(MAX_QUOTED_RECOMMENDATIONS)
            .enumerate()
        {
            let _ = writeln!(out, "{}. {}", i + 1, rec);
        }
    }
    if !m.all_issues.is_empty() {
        out.push_str("Key issues:\n");
        for issue in m.top_issues().iter().take(MAX_QUOTED_ISSUES) {
            let _ = writeln!(out, "- {}", issue);
        }
    }
    out.trim_end().to_string()
}

fn render_comparison(a: &str, b: &str, diffs: &[MetricDifference], epsilon: f64) -> String {
    if diffs.is_empty() {
        return format!(
            "{} and {} differ by no more than {:.2} on every available metric.",
            a, b, epsilon
        );
    }
    let mut out = format!("Comparison of {} and {}:\n", a, b);
    for d in diffs {
        let _ = writeln!(
            out,
            "- {}: {} is higher by {:.2}",
            d.metric.label(),
            d.higher_district,
            d.magnitude
        );
    }
    out.trim_end().to_string()
}

fn render_ranking(view: &AllDistrictMetrics) -> String {
    let mut out = String::from("Districts ranked by P-Score:\n");
    let mut rank = 0;
    for row in &view.districts {
        let Some(m) = &row.metrics else { continue };
        if rank == MAX_RANKED {
            break;
        }
        rank += 1;
        let _ = write!(out, "{}. {}: {}", rank, row.district, fmt_score(&m.p_score));
        if let Some(level) = m.priority_level {
            let _ = write!(out, " ({})", level);
        }
        out.push('\n');
    }
    if view.failed > 0 {
        let _ = writeln!(out, "{} district(s) could not be scored.", view.failed);
    }
    out.trim_end().to_string()
}

fn general_help(districts: &[String]) -> String {
    format!(
        "I couldn't identify a district in your question. Ask about one district, compare two, or ask which district needs attention most. Available districts: {}.",
        districts.join(", ")
    )
}

/// Answer a chatbot query over the current snapshots.
///
/// When the response is district-specific, `detected_district` is a stored
/// district and `metrics` holds its freshly computed result.
pub fn route_query(
    engine: &MetricEngine,
    snapshots: &[DistrictOperationalSnapshot],
    query: &str,
    district_filter: Option<&str>,
) -> QueryResponse {
    let known = district_names(snapshots);
    let epsilon = engine.thresholds().compare_epsilon;

    let (query_type, agents, districts, mut xai_log) = match route(query, district_filter, &known) {
        RoutingDecision::Greeting { xai_log } => {
            return QueryResponse {
                response_text: GREETING_RESPONSE.to_string(),
                success: true,
                is_district_specific: false,
                detected_district: None,
                xai_log,
                query_type: QueryType::Greeting,
                agents: Vec::new(),
                metrics: None,
            };
        }
        RoutingDecision::UnknownFilter { filter, xai_log } => {
            return QueryResponse {
                response_text: format!(
                    "District '{}' was not found. Available districts: {}.",
                    filter,
                    known.join(", ")
                ),
                success: false,
                is_district_specific: false,
                detected_district: None,
                xai_log,
                query_type: QueryType::SingleDistrict,
                agents: Vec::new(),
                metrics: None,
            };
        }
        RoutingDecision::Routed {
            query_type,
            agents,
            districts,
            xai_log,
        } => (query_type, agents, districts, xai_log),
    };

    let mut response = QueryResponse {
        response_text: String::new(),
        success: true,
        is_district_specific: false,
        detected_district: None,
        xai_log: Vec::new(),
        query_type,
        agents,
        metrics: None,
    };

    match query_type {
        QueryType::SingleDistrict => match districts
            .first()
            .ok_or_else(|| "no district resolved".to_string())
            .and_then(|d| find_snapshot(snapshots, d).map_err(|e| e.to_string()))
        {
            Ok(snapshot) => {
                let metrics = engine.compute_metrics(snapshot);
                xai_log.push(XaiLogEntry::new(
                    "compute_metrics",
                    metrics.district.clone(),
                    format!(
                        "P-Score {} from {} available component score(s)",
                        fmt_score(&metrics.p_score),
                        [&metrics.hvi_score, &metrics.iss_score, &metrics.rcs_score]
                            .iter()
                            .filter(|s| s.is_available())
                            .count()
                    ),
                ));
                response.response_text = render_district(&metrics);
                response.is_district_specific = true;
                response.detected_district = Some(metrics.district.clone());
                response.metrics = Some(metrics);
            }
            Err(reason) => {
                xai_log.push(XaiLogEntry::new("compute_metrics", "failed", reason.clone()));
                response.response_text = reason;
                response.success = false;
            }
        },
        QueryType::Comparative => {
            let pair: Vec<&DistrictOperationalSnapshot> = districts
                .iter()
                .take(2)
                .filter_map(|d| find_snapshot(snapshots, d).ok())
                .collect();
            if let [a, b] = pair.as_slice() {
                let ma = engine.compute_metrics(a);
                let mb = engine.compute_metrics(b);
                let diffs = compare(&ma, &mb, epsilon);
                xai_log.push(XaiLogEntry::new(
                    "compare",
                    format!("{} vs {}", ma.district, mb.district),
                    format!(
                        "{} metric(s) differ by more than {:.2}",
                        diffs.len(),
                        epsilon
                    ),
                ));
                response.response_text =
                    render_comparison(&ma.district, &mb.district, &diffs, epsilon);
            } else {
                xai_log.push(XaiLogEntry::new(
                    "compare",
                    "failed",
                    "Fewer than two districts could be resolved",
                ));
                response.response_text = general_help(&known);
                response.success = false;
            }
        }
        QueryType::MultiDistrict => {
            let view = ranking_view(compute_all(engine, snapshots));
            xai_log.push(XaiLogEntry::new(
                "rank",
                format!("{} district(s)", view.total),
                "All districts ranked by P-Score, descending",
            ));
            response.response_text = render_ranking(&view);
        }
        QueryType::General | QueryType::Greeting => {
            response.response_text = general_help(&known);
        }
    }

    xai_log.push(XaiLogEntry::new(
        "synthesize",
        query_type.as_str(),
        format!(
            "Response rendered from {} agent(s)",
            response.agents.len()
        ),
    ));
    response.xai_log = xai_log;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SnapshotField;

    fn snapshot(district: &str, emergency: f64) -> DistrictOperationalSnapshot {
        DistrictOperationalSnapshot::new(district)
            .with(SnapshotField::PredictedEmergencyCases, emergency)
            .with(SnapshotField::IcuBeds, 1.0)
            .with(SnapshotField::BedOccupancyRate, 1.0)
            .with(SnapshotField::BedCapacity, 1.0)
    }

    fn snapshots() -> Vec<DistrictOperationalSnapshot> {
        vec![snapshot("Pune", 9.0), snapshot("Nagpur", 3.0), snapshot("Thane", 6.5)]
    }

    fn steps(response: &QueryResponse) -> Vec<&str> {
        response.xai_log.iter().map(|e| e.step.as_str()).collect()
    }

    #[test]
    fn test_greeting() {
        let r = route_query(&MetricEngine::default(), &snapshots(), "Hello!", None);
        assert!(r.success);
        assert!(!r.is_district_specific);
        assert_eq!(r.response_text, GREETING_RESPONSE);
        assert_eq!(r.query_type, QueryType::Greeting);
    }

    #[test]
    fn test_single_district_is_resolvable() {
        let r = route_query(
            &MetricEngine::default(),
            &snapshots(),
            "how vulnerable is PUNE right now",
            None,
        );
        assert!(r.success);
        assert!(r.is_district_specific);
        assert_eq!(r.detected_district.as_deref(), Some("Pune"));
        let metrics = r.metrics.as_ref().unwrap();
        assert_eq!(metrics.hvi_score.value(), Some(9.0));
        assert!(r.response_text.starts_with("Pune: P-Score"));
        assert_eq!(
            steps(&r),
            vec!["route", "resolve_district", "compute_metrics", "synthesize"]
        );
    }

    #[test]
    fn test_comparison_is_not_district_specific() {
        let r = route_query(
            &MetricEngine::default(),
            &snapshots(),
            "compare pune and nagpur",
            None,
        );
        assert!(r.success);
        assert!(!r.is_district_specific);
        assert_eq!(r.detected_district, None);
        assert_eq!(r.query_type, QueryType::Comparative);
        assert!(r.response_text.contains("HVI: Pune is higher by 6.00"));
        assert_eq!(steps(&r)[2], "compare");
    }

    #[test]
    fn test_ranking_query() {
        let r = route_query(
            &MetricEngine::default(),
            &snapshots(),
            "which district needs attention first?",
            None,
        );
        assert_eq!(r.query_type, QueryType::MultiDistrict);
        let lines: Vec<&str> = r.response_text.lines().collect();
        assert!(lines[1].starts_with("1. Pune"));
        assert!(lines[2].starts_with("2. Thane"));
        assert!(lines[3].starts_with("3. Nagpur"));
    }

    #[test]
    fn test_unknown_filter_fails() {
        let r = route_query(&MetricEngine::default(), &snapshots(), "metrics", Some("Goa"));
        assert!(!r.success);
        assert!(!r.is_district_specific);
        assert!(r.response_text.contains("'Goa' was not found"));
    }

    #[test]
    fn test_general_query_lists_districts() {
        let r = route_query(&MetricEngine::default(), &snapshots(), "what can you do", None);
        assert!(r.success);
        assert_eq!(r.query_type, QueryType::General);
        assert!(r.response_text.contains("Nagpur, Pune, Thane"));
    }

    #[test]
    fn test_district_names_sorted_and_unique() {
        let mut snaps = snapshots();
        snaps.push(snapshot("pune", 1.0));
        assert_eq!(district_names(&snaps), vec!["Nagpur", "Pune", "Thane"]);
    }
}
