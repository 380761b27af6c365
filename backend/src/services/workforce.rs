//! Workforce capacity views over the per-district rosters.

use std::collections::{BTreeMap, BTreeSet};

use crate::api::{
    CapacityMetrics, CapacitySummary, DistrictCapacity, DistrictWorkforceRow,
    DistrictWorkforceSummary, RoleCapacity, ServiceTicket, WorkforceRoster,
};
use crate::services::aggregate::AggregationError;
use crate::services::stats;
use crate::services::tickets::is_open;

/// Roles listed in the capacity summary.
pub const TOP_ROLES: usize = 5;
/// Availability (percent) below which a critical-service role is short.
pub const SHORTFALL_AVAILABILITY_PCT: f64 = 85.0;
/// Role name fragments of the critical services.
const CRITICAL_ROLE_MARKERS: &[&str] = &["police", "nurse", "doctor"];
/// Role name fragments counted as health staff.
const HEALTH_ROLE_MARKERS: &[&str] = &["nurse", "doctor", "medical"];
/// Average police availability (percent) below which a district is flagged.
pub const POLICE_SHORTFALL_PCT: f64 = 90.0;
/// At most this many districts carry the police shortfall flag.
pub const MAX_POLICE_SHORTFALLS: usize = 2;

impl RoleCapacity {
    fn empty(role: &str) -> Self {
        Self {
            role: role.to_string(),
            total: 0,
            available: 0,
            deployed: 0,
        }
    }

    fn add(&mut self, roster: &WorkforceRoster) {
        self.total += roster.total;
        self.available += roster.available;
        self.deployed += roster.deployed;
    }

    pub fn availability_pct(&self) -> Option<f64> {
        (self.total > 0).then(|| self.available as f64 / self.total as f64 * 100.0)
    }
}

/// Rosters summed per role, in role order.
fn by_role<'a>(rosters: impl Iterator<Item = &'a WorkforceRoster>) -> Vec<RoleCapacity> {
    let mut roles: BTreeMap<&str, RoleCapacity> = BTreeMap::new();
    for roster in rosters {
        roles
            .entry(roster.role.as_str())
            .or_insert_with(|| RoleCapacity::empty(&roster.role))
            .add(roster);
    }
    roles.into_values().collect()
}

fn role_matches(role: &str, markers: &[&str]) -> bool {
    let role = role.to_lowercase();
    markers.iter().any(|m| role.contains(m))
}

fn is_critical_role(role: &str) -> bool {
    role_matches(role, CRITICAL_ROLE_MARKERS)
}

/// Totals over every district plus the largest roles by head-count.
pub fn capacity_summary(rosters: &[WorkforceRoster]) -> CapacitySummary {
    let mut roles = by_role(rosters.iter());
    roles.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.role.cmp(&b.role)));
    roles.truncate(TOP_ROLES);

    CapacitySummary {
        total_workforce: rosters.iter().map(|r| r.total).sum(),
        available_capacity: rosters.iter().map(|r| r.available).sum(),
        total_deployed: rosters.iter().map(|r| r.deployed).sum(),
        top_categories: roles,
    }
}

pub fn district_capacity(
    rosters: &[WorkforceRoster],
    district: &str,
) -> Result<DistrictCapacity, AggregationError> {
    let wanted = district.trim();
    let matching: Vec<&WorkforceRoster> = rosters
        .iter()
        .filter(|r| r.district.eq_ignore_ascii_case(wanted))
        .collect();
    let Some(first) = matching.first() else {
        return Err(AggregationError::UnknownDistrict(wanted.to_string()));
    };
    Ok(DistrictCapacity {
        district: first.district.clone(),
        roles: by_role(matching.iter().copied()),
    })
}

pub fn workforce_districts(rosters: &[WorkforceRoster]) -> Vec<String> {
    rosters
        .iter()
        .map(|r| r.district.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Deployment total, critical-service shortfalls and the best-staffed role.
///
/// A district counts once towards the shortfall alerts when any of its
/// police, nursing or doctor rosters is below the availability floor.
pub fn capacity_metrics(rosters: &[WorkforceRoster]) -> CapacityMetrics {
    let short_districts: BTreeSet<&str> = rosters
        .iter()
        .filter(|r| is_critical_role(&r.role) && r.availability_pct() < SHORTFALL_AVAILABILITY_PCT)
        .map(|r| r.district.as_str())
        .collect();

    let best = by_role(rosters.iter())
        .into_iter()
        .filter_map(|role| role.availability_pct().map(|pct| (role.role, pct)))
        .fold(None, |best: Option<(String, f64)>, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        });

    CapacityMetrics {
        total_deployed: rosters.iter().map(|r| r.deployed).sum(),
        critical_shortfall_alerts: short_districts.len(),
        highest_availability_role: best.as_ref().map(|b| b.0.clone()),
        highest_availability_pct: best.map(|b| (b.1 * 10.0).round() / 10.0),
    }
}

/// Per-district table: open tickets, available head-count, health staff in
/// use and the police shortfall flag.
///
/// Only the districts with the lowest average police availability are
/// flagged, and only when that average is below [`POLICE_SHORTFALL_PCT`].
pub fn district_summary(
    rosters: &[WorkforceRoster],
    tickets: &[ServiceTicket],
) -> DistrictWorkforceSummary {
    let mut police: Vec<(usize, f64)> = Vec::new();
    let mut rows: Vec<DistrictWorkforceRow> = Vec::new();

    for district in workforce_districts(rosters) {
        let own: Vec<&WorkforceRoster> =
            rosters.iter().filter(|r| r.district == district).collect();

        let health: Vec<&&WorkforceRoster> = own
            .iter()
            .filter(|r| role_matches(&r.role, HEALTH_ROLE_MARKERS))
            .collect();
        let health_total: u32 = health.iter().map(|r| r.total).sum();
        let health_deployed: u32 = health.iter().map(|r| r.deployed).sum();
        let health_staff_used_pct = if health_total > 0 {
            let pct = health_deployed.min(health_total) as f64 / health_total as f64 * 100.0;
            (pct * 10.0).round() / 10.0
        } else {
            0.0
        };

        let police_pcts: Vec<f64> = own
            .iter()
            .filter(|r| role_matches(&r.role, &["police"]))
            // An empty roster is not a shortfall.
            .map(|r| if r.total > 0 { r.availability_pct() } else { 100.0 })
            .collect();
        if let Some(avg) = stats::mean(&police_pcts) {
            police.push((rows.len(), avg));
        }

        rows.push(DistrictWorkforceRow {
            active_alerts: tickets
                .iter()
                .filter(|t| t.district.eq_ignore_ascii_case(&district) && is_open(t))
                .count(),
            total_available_workforce: own.iter().map(|r| r.available).sum(),
            health_staff_used_pct,
            police_safety_shortfall: false,
            district,
        });
    }

    police.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    for (index, availability) in police.into_iter().take(MAX_POLICE_SHORTFALLS) {
        if availability < POLICE_SHORTFALL_PCT {
            rows[index].police_safety_shortfall = true;
        }
    }

    DistrictWorkforceSummary { districts: rows }
}
