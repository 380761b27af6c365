//! District operational snapshots.
//!
//! A snapshot is the per-district aggregate of the operational tables (health
//! facilities, service requests, workforce rosters) for one reporting window.
//! It is the only input of the metric engine.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Read a numeric input, treating anything that is not a finite number as
/// absent.
///
/// Numeric strings (`"40"`) are accepted. Other values (`"N/A"`, `true`,
/// objects) only make the affected sub-scores unavailable.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match &value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(Some(n)),
        _ => {
            if let Some(raw) = value.filter(|v| !v.is_null()) {
                log::warn!("Ignoring non-numeric snapshot input {}", raw);
            }
            Ok(None)
        }
    }
}

/// Per-district aggregate inputs for a fixed reporting window.
///
/// Every numeric input is optional: an absent value must stay distinguishable
/// from a real zero, because a defaulted zero would read as "no vulnerability".
/// Rates (`bed_occupancy_rate`, `worker_utilization_rate`) are fractions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DistrictOperationalSnapshot {
    pub district: String,

    // Health (HVI)
    #[serde(default, deserialize_with = "lenient_number")]
    pub predicted_emergency_cases: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub icu_beds: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub bed_occupancy_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub bed_capacity: Option<f64>,

    // Infrastructure (ISS)
    #[serde(default, deserialize_with = "lenient_number")]
    pub service_request_volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub infrastructure_capacity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub demand_forecast: Option<f64>,

    // Resources (RCS)
    #[serde(default, deserialize_with = "lenient_number")]
    pub worker_utilization_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub available_workers: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub escalated_requests: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_requests: Option<f64>,

    // Equity (SEL)
    #[serde(default, deserialize_with = "lenient_number")]
    pub resolution_time_low_literacy: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub resolution_time_high_literacy: Option<f64>,
}

/// Names of the numeric snapshot inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotField {
    PredictedEmergencyCases,
    IcuBeds,
    BedOccupancyRate,
    BedCapacity,
    ServiceRequestVolume,
    InfrastructureCapacity,
    DemandForecast,
    WorkerUtilizationRate,
    AvailableWorkers,
    EscalatedRequests,
    TotalRequests,
    ResolutionTimeLowLiteracy,
    ResolutionTimeHighLiteracy,
}

impl SnapshotField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotField::PredictedEmergencyCases => "predicted_emergency_cases",
            SnapshotField::IcuBeds => "icu_beds",
            SnapshotField::BedOccupancyRate => "bed_occupancy_rate",
            SnapshotField::BedCapacity => "bed_capacity",
            SnapshotField::ServiceRequestVolume => "service_request_volume",
            SnapshotField::InfrastructureCapacity => "infrastructure_capacity",
            SnapshotField::DemandForecast => "demand_forecast",
            SnapshotField::WorkerUtilizationRate => "worker_utilization_rate",
            SnapshotField::AvailableWorkers => "available_workers",
            SnapshotField::EscalatedRequests => "escalated_requests",
            SnapshotField::TotalRequests => "total_requests",
            SnapshotField::ResolutionTimeLowLiteracy => "resolution_time_low_literacy",
            SnapshotField::ResolutionTimeHighLiteracy => "resolution_time_high_literacy",
        }
    }
}

impl fmt::Display for SnapshotField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DistrictOperationalSnapshot {
    /// Create an empty snapshot for a district (every input unavailable).
    pub fn new(district: impl Into<String>) -> Self {
        Self {
            district: district.into(),
            ..Default::default()
        }
    }

    /// Raw value of a field, as stored.
    pub fn get(&self, field: SnapshotField) -> Option<f64> {
        match field {
            SnapshotField::PredictedEmergencyCases => self.predicted_emergency_cases,
            SnapshotField::IcuBeds => self.icu_beds,
            SnapshotField::BedOccupancyRate => self.bed_occupancy_rate,
            SnapshotField::BedCapacity => self.bed_capacity,
            SnapshotField::ServiceRequestVolume => self.service_request_volume,
            SnapshotField::InfrastructureCapacity => self.infrastructure_capacity,
            SnapshotField::DemandForecast => self.demand_forecast,
            SnapshotField::WorkerUtilizationRate => self.worker_utilization_rate,
            SnapshotField::AvailableWorkers => self.available_workers,
            SnapshotField::EscalatedRequests => self.escalated_requests,
            SnapshotField::TotalRequests => self.total_requests,
            SnapshotField::ResolutionTimeLowLiteracy => self.resolution_time_low_literacy,
            SnapshotField::ResolutionTimeHighLiteracy => self.resolution_time_high_literacy,
        }
    }

    /// Builder-style setter used by fixtures and tests.
    pub fn with(mut self, field: SnapshotField, value: f64) -> Self {
        let slot = match field {
            SnapshotField::PredictedEmergencyCases => &mut self.predicted_emergency_cases,
            SnapshotField::IcuBeds => &mut self.icu_beds,
            SnapshotField::BedOccupancyRate => &mut self.bed_occupancy_rate,
            SnapshotField::BedCapacity => &mut self.bed_capacity,
            SnapshotField::ServiceRequestVolume => &mut self.service_request_volume,
            SnapshotField::InfrastructureCapacity => &mut self.infrastructure_capacity,
            SnapshotField::DemandForecast => &mut self.demand_forecast,
            SnapshotField::WorkerUtilizationRate => &mut self.worker_utilization_rate,
            SnapshotField::AvailableWorkers => &mut self.available_workers,
            SnapshotField::EscalatedRequests => &mut self.escalated_requests,
            SnapshotField::TotalRequests => &mut self.total_requests,
            SnapshotField::ResolutionTimeLowLiteracy => &mut self.resolution_time_low_literacy,
            SnapshotField::ResolutionTimeHighLiteracy => &mut self.resolution_time_high_literacy,
        };
        *slot = Some(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let snapshot: DistrictOperationalSnapshot =
            serde_json::from_str(r#"{"district": "Pune", "icu_beds": 40}"#).unwrap();

        assert_eq!(snapshot.district, "Pune");
        assert_eq!(snapshot.icu_beds, Some(40.0));
        assert_eq!(snapshot.bed_capacity, None);
    }

    #[test]
    fn test_non_numeric_inputs_are_unavailable() {
        let snapshot: DistrictOperationalSnapshot = serde_json::from_str(
            r#"{"district": "Pune", "icu_beds": "N/A", "bed_capacity": "450",
                "total_requests": true, "escalated_requests": null,
                "available_workers": {"count": 4}, "demand_forecast": 900}"#,
        )
        .unwrap();

        assert_eq!(snapshot.icu_beds, None);
        assert_eq!(snapshot.bed_capacity, Some(450.0));
        assert_eq!(snapshot.total_requests, None);
        assert_eq!(snapshot.escalated_requests, None);
        assert_eq!(snapshot.available_workers, None);
        assert_eq!(snapshot.demand_forecast, Some(900.0));
    }

    #[test]
    fn test_with_sets_field() {
        let snapshot = DistrictOperationalSnapshot::new("Thane")
            .with(SnapshotField::TotalRequests, 120.0);

        assert_eq!(snapshot.get(SnapshotField::TotalRequests), Some(120.0));
        assert_eq!(snapshot.get(SnapshotField::EscalatedRequests), None);
    }

    #[test]
    fn test_field_names_match_serde() {
        let json = serde_json::to_string(&SnapshotField::ResolutionTimeHighLiteracy).unwrap();
        assert_eq!(json, "\"resolution_time_high_literacy\"");
        assert_eq!(
            SnapshotField::ResolutionTimeHighLiteracy.to_string(),
            "resolution_time_high_literacy"
        );
    }
}
