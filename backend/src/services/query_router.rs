//! Keyword query routing for the chatbot.
//!
//! Maps a free-text question and an optional district filter to an intent,
//! the analysis agents it concerns and the districts it names. Every decision
//! is recorded in an XAI trace. A district returned here is always one of the
//! known districts, spelled as stored.

use crate::api::{Agent, QueryType, XaiLogEntry};

pub const GREETING_RESPONSE: &str = "Hello! I'm the AI Admin Assistant. I can help you analyze districts, health infrastructure, resources, and service metrics. What would you like to know?";

/// Filter value meaning "no district filter".
pub const ALL_DISTRICTS: &str = "All Districts";

const GREETINGS: &[&str] = &[
    "good morning",
    "good afternoon",
    "good evening",
    "good night",
    "greetings",
    "hello",
    "hey",
    "hi",
];

/// Per-word fuzzy matches need at least this normalised similarity.
pub const FUZZY_WORD_CUTOFF: f64 = 0.75;
/// A single-word query may match a little more loosely.
pub const FUZZY_QUERY_CUTOFF: f64 = 0.7;
/// Words this short are never fuzzy-matched.
const MIN_FUZZY_WORD_LEN: usize = 5;

const COMPARE_KEYWORDS: &[&str] = &["compare", "comparison", "difference", "between", "versus", "vs"];
const MULTI_DISTRICT_KEYWORDS: &[&str] = &[
    "all districts",
    "across districts",
    "every district",
    "which district",
    "rank",
    "ranking",
    "top",
    "highest",
    "lowest",
];
const HEALTH_KEYWORDS: &[&str] = &[
    "health",
    "hospital",
    "bed",
    "beds",
    "icu",
    "emergency",
    "disease",
    "vulnerability",
    "hvi",
];
const INFRASTRUCTURE_KEYWORDS: &[&str] = &[
    "infrastructure",
    "road",
    "roads",
    "water",
    "electricity",
    "service request",
    "strain",
    "iss",
];
const RESOURCE_KEYWORDS: &[&str] = &[
    "worker",
    "workers",
    "resource",
    "resources",
    "utilization",
    "availability",
    "staff",
    "contention",
    "rcs",
];

/// How the districts of a query were resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum DistrictMatch {
    /// The explicit district filter.
    Filter(String),
    /// District names found verbatim in the query, in order of appearance.
    Exact(Vec<String>),
    /// A misspelt district name.
    Fuzzy {
        district: String,
        word: String,
        similarity: f64,
    },
    None,
}

impl DistrictMatch {
    pub fn districts(&self) -> Vec<String> {
        match self {
            DistrictMatch::Filter(d) => vec![d.clone()],
            DistrictMatch::Exact(ds) => ds.clone(),
            DistrictMatch::Fuzzy { district, .. } => vec![district.clone()],
            DistrictMatch::None => Vec::new(),
        }
    }
}

/// Outcome of routing one query.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingDecision {
    Greeting {
        xai_log: Vec<XaiLogEntry>,
    },
    /// The district filter names a district that does not exist.
    UnknownFilter {
        filter: String,
        xai_log: Vec<XaiLogEntry>,
    },
    Routed {
        query_type: QueryType,
        agents: Vec<Agent>,
        districts: Vec<String>,
        xai_log: Vec<XaiLogEntry>,
    },
}

fn normalise(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Alphanumeric words of a lower-cased query.
fn words(query_lower: &str) -> Vec<&str> {
    query_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Phrases match as substrings, single keywords as whole words.
fn mentions(query_lower: &str, words: &[&str], keyword: &str) -> bool {
    if keyword.contains(' ') {
        query_lower.contains(keyword)
    } else {
        words.contains(&keyword)
    }
}

fn mentions_any(query_lower: &str, words: &[&str], keywords: &[&str]) -> bool {
    keywords.iter().any(|k| mentions(query_lower, words, k))
}

/// True when the query is, or starts with, a greeting.
pub fn is_greeting(query: &str) -> bool {
    let q = normalise(query);
    GREETINGS.iter().any(|g| match q.strip_prefix(g) {
        Some(rest) => rest.chars().next().map_or(true, |c| !c.is_alphanumeric()),
        None => false,
    })
}

/// True when a district filter means "no filter".
pub fn is_all_districts(filter: Option<&str>) -> bool {
    match filter.map(str::trim) {
        None => true,
        Some(f) => f.is_empty() || f.eq_ignore_ascii_case(ALL_DISTRICTS),
    }
}

fn best_fuzzy<'a>(candidate: &str, known: &'a [String], cutoff: f64) -> Option<(&'a String, f64)> {
    known
        .iter()
        .map(|d| (d, strsim::normalized_levenshtein(candidate, &d.to_lowercase())))
        .filter(|(_, score)| *score >= cutoff)
        .fold(None, |best: Option<(&String, f64)>, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        })
}

/// Resolve the districts named in a query.
///
/// Exact substring matches win; otherwise the first query word longer than
/// four characters that is close to a district name; otherwise a single-word
/// query compared as a whole.
pub fn match_districts(query: &str, known: &[String]) -> DistrictMatch {
    let q = normalise(query);

    let mut exact: Vec<(usize, &String)> = known
        .iter()
        .filter_map(|d| q.find(&d.to_lowercase()).map(|pos| (pos, d)))
        .collect();
    if !exact.is_empty() {
        exact.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        return DistrictMatch::Exact(exact.into_iter().map(|(_, d)| d.clone()).collect());
    }

    let query_words = words(&q);
    for word in query_words.iter().filter(|w| w.chars().count() >= MIN_FUZZY_WORD_LEN) {
        if let Some((district, similarity)) = best_fuzzy(word, known, FUZZY_WORD_CUTOFF) {
            return DistrictMatch::Fuzzy {
                district: district.clone(),
                word: word.to_string(),
                similarity,
            };
        }
    }

    if query_words.len() == 1 && q.chars().count() >= MIN_FUZZY_WORD_LEN {
        if let Some((district, similarity)) = best_fuzzy(&q, known, FUZZY_QUERY_CUTOFF) {
            return DistrictMatch::Fuzzy {
                district: district.clone(),
                word: q.clone(),
                similarity,
            };
        }
    }

    DistrictMatch::None
}

/// Agents whose keywords appear in the query, in fixed order.
pub fn select_agents(query: &str) -> Vec<Agent> {
    let q = normalise(query);
    let w = words(&q);

    let mut agents = Vec::new();
    if mentions_any(&q, &w, COMPARE_KEYWORDS) || mentions_any(&q, &w, MULTI_DISTRICT_KEYWORDS) {
        agents.push(Agent::DataRetrieval);
    }
    if mentions_any(&q, &w, HEALTH_KEYWORDS) {
        agents.push(Agent::Health);
    }
    if mentions_any(&q, &w, INFRASTRUCTURE_KEYWORDS) {
        agents.push(Agent::Infrastructure);
    }
    if mentions_any(&q, &w, RESOURCE_KEYWORDS) {
        agents.push(Agent::Resource);
    }
    if agents.is_empty() {
        agents.push(Agent::DataRetrieval);
    }
    agents
}

fn agent_names(agents: &[Agent]) -> String {
    agents
        .iter()
        .map(Agent::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn resolve_filter(filter: Option<&str>, known: &[String]) -> Option<Result<String, String>> {
    if is_all_districts(filter) {
        return None;
    }
    let wanted = filter.map(str::trim).unwrap_or_default();
    Some(
        known
            .iter()
            .find(|d| d.eq_ignore_ascii_case(wanted))
            .cloned()
            .ok_or_else(|| wanted.to_string()),
    )
}

fn describe_match(found: &DistrictMatch) -> (String, String) {
    match found {
        DistrictMatch::Filter(d) => (d.clone(), "District selected by the request filter".to_string()),
        DistrictMatch::Exact(ds) => (
            ds.join(", "),
            format!("Exact district name match in query ({} found)", ds.len()),
        ),
        DistrictMatch::Fuzzy {
            district,
            word,
            similarity,
        } => (
            district.clone(),
            format!("Fuzzy match of '{}' (similarity {:.2})", word, similarity),
        ),
        DistrictMatch::None => ("none".to_string(), "No district mentioned in the query".to_string()),
    }
}

/// Route a query: greeting short-circuit, district filter, district
/// resolution, then intent and agent selection.
pub fn route(query: &str, filter: Option<&str>, known: &[String]) -> RoutingDecision {
    if is_greeting(query) {
        return RoutingDecision::Greeting {
            xai_log: vec![XaiLogEntry::new(
                "route",
                QueryType::Greeting.as_str(),
                "Query is a greeting; no analysis required",
            )],
        };
    }

    let agents = select_agents(query);
    let mut xai_log = vec![XaiLogEntry::new(
        "route",
        agent_names(&agents),
        "Keyword routing over health, infrastructure, resource and comparison terms",
    )];

    let found = match resolve_filter(filter, known) {
        Some(Ok(district)) => DistrictMatch::Filter(district),
        Some(Err(unknown)) => {
            xai_log.push(XaiLogEntry::new(
                "resolve_district",
                "unknown",
                format!("District filter '{}' is not a known district", unknown),
            ));
            return RoutingDecision::UnknownFilter {
                filter: unknown,
                xai_log,
            };
        }
        None => match_districts(query, known),
    };

    let (decision, reasoning) = describe_match(&found);
    xai_log.push(XaiLogEntry::new("resolve_district", decision, reasoning));

    let districts = found.districts();
    let q = normalise(query);
    let w = words(&q);
    let query_type = match districts.len() {
        0 if mentions_any(&q, &w, MULTI_DISTRICT_KEYWORDS) || mentions_any(&q, &w, COMPARE_KEYWORDS) => {
            QueryType::MultiDistrict
        }
        0 => QueryType::General,
        1 => QueryType::SingleDistrict,
        _ => QueryType::Comparative,
    };

    let mut agents = agents;
    if matches!(query_type, QueryType::Comparative | QueryType::MultiDistrict)
        && !agents.contains(&Agent::DataRetrieval)
    {
        agents.insert(0, Agent::DataRetrieval);
    }

    RoutingDecision::Routed {
        query_type,
        agents,
        districts,
        xai_log,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<String> {
        ["Pune", "Nagpur", "Jalgaon", "Mumbai", "Thane"]
            .iter()
            .map(|d| d.to_string())
            .collect()
    }

    #[test]
    fn test_greetings() {
        assert!(is_greeting("Hello"));
        assert!(is_greeting("  hi there"));
        assert!(is_greeting("Good morning, team"));
        assert!(!is_greeting("history of Pune"));
        assert!(!is_greeting("which district is worst?"));
    }

    #[test]
    fn test_greeting_short_circuits() {
        match route("hey", Some("Pune"), &known()) {
            RoutingDecision::Greeting { xai_log } => {
                assert_eq!(xai_log.len(), 1);
                assert_eq!(xai_log[0].decision, "greeting");
            }
            other => panic!("expected greeting, got {:?}", other),
        }
    }

    #[test]
    fn test_exact_match_single_district() {
        match route("What is the health status of pune?", None, &known()) {
            RoutingDecision::Routed {
                query_type,
                agents,
                districts,
                xai_log,
            } => {
                assert_eq!(query_type, QueryType::SingleDistrict);
                assert_eq!(districts, vec!["Pune"]);
                assert_eq!(agents, vec![Agent::Health]);
                let steps: Vec<&str> = xai_log.iter().map(|e| e.step.as_str()).collect();
                assert_eq!(steps, vec!["route", "resolve_district"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_multiple_districts_are_comparative() {
        match route("Thane versus Pune workers", None, &known()) {
            RoutingDecision::Routed {
                query_type,
                agents,
                districts,
                ..
            } => {
                assert_eq!(query_type, QueryType::Comparative);
                assert_eq!(districts, vec!["Thane", "Pune"]);
                assert_eq!(agents, vec![Agent::DataRetrieval, Agent::Resource]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fuzzy_match() {
        match match_districts("how is nagpor doing", &known()) {
            DistrictMatch::Fuzzy {
                district,
                word,
                similarity,
            } => {
                assert_eq!(district, "Nagpur");
                assert_eq!(word, "nagpor");
                assert!(similarity >= FUZZY_WORD_CUTOFF);
            }
            other => panic!("expected fuzzy match, got {:?}", other),
        }
        assert_eq!(match_districts("how is goa doing", &known()), DistrictMatch::None);
    }

    #[test]
    fn test_filter_overrides_query_text() {
        match route("show metrics for thane", Some("jalgaon"), &known()) {
            RoutingDecision::Routed { districts, .. } => assert_eq!(districts, vec!["Jalgaon"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_all_districts_filter_is_ignored() {
        assert!(is_all_districts(Some("All Districts")));
        assert!(is_all_districts(Some("all districts")));
        assert!(is_all_districts(None));
        match route("show metrics for thane", Some("All Districts"), &known()) {
            RoutingDecision::Routed { districts, .. } => assert_eq!(districts, vec!["Thane"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_filter() {
        match route("show metrics", Some("Goa"), &known()) {
            RoutingDecision::UnknownFilter { filter, xai_log } => {
                assert_eq!(filter, "Goa");
                assert_eq!(xai_log.last().map(|e| e.step.as_str()), Some("resolve_district"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ranking_and_general_queries() {
        match route("Which district has the highest strain?", None, &known()) {
            RoutingDecision::Routed {
                query_type, agents, ..
            } => {
                assert_eq!(query_type, QueryType::MultiDistrict);
                assert_eq!(agents, vec![Agent::DataRetrieval, Agent::Infrastructure]);
            }
            other => panic!("unexpected {:?}", other),
        }

        match route("what can you do", None, &known()) {
            RoutingDecision::Routed {
                query_type, agents, ..
            } => {
                assert_eq!(query_type, QueryType::General);
                assert_eq!(agents, vec![Agent::DataRetrieval]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_keywords_match_whole_words() {
        // "stop" must not trigger "top", "bedside" must not trigger "bed".
        assert_eq!(select_agents("stop the bedside chat"), vec![Agent::DataRetrieval]);
    }
}
