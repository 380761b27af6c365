use serde::{Deserialize, Serialize};

// =========================================================
// Workforce capacity types + route
// =========================================================

/// Head-count of one role, summed over whatever scope the caller chose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCapacity {
    pub role: String,
    pub total: u32,
    pub available: u32,
    pub deployed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacitySummary {
    pub total_workforce: u32,
    pub available_capacity: u32,
    pub total_deployed: u32,
    /// Largest roles by head-count.
    pub top_categories: Vec<RoleCapacity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictCapacity {
    pub district: String,
    pub roles: Vec<RoleCapacity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityMetrics {
    pub total_deployed: u32,
    /// Districts with at least one critical-service role below the
    /// availability floor.
    pub critical_shortfall_alerts: usize,
    pub highest_availability_role: Option<String>,
    pub highest_availability_pct: Option<f64>,
}

/// One row of the per-district workforce table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictWorkforceRow {
    pub district: String,
    /// Open service tickets in the district.
    pub active_alerts: usize,
    pub total_available_workforce: u32,
    /// Deployed share of doctors, nurses and medical staff, in percent.
    pub health_staff_used_pct: f64,
    pub police_safety_shortfall: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DistrictWorkforceSummary {
    pub districts: Vec<DistrictWorkforceRow>,
}

pub const GET_CAPACITY_SUMMARY: &str = "get_capacity_summary";
pub const GET_DISTRICT_CAPACITY: &str = "get_district_capacity";
pub const LIST_WORKFORCE_DISTRICTS: &str = "list_workforce_districts";
pub const GET_CAPACITY_METRICS: &str = "get_capacity_metrics";
pub const GET_DISTRICT_WORKFORCE_SUMMARY: &str = "get_district_workforce_summary";
