//! Request/response shapes of the external `/vrp/solve` endpoint

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VrpLocation {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

/// Seconds from midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrpTimeWindow {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VrpRequest {
    /// Depot first
    pub locations: Vec<VrpLocation>,
    pub num_vehicles: usize,
    pub depot_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_capacities: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demands: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_windows: Option<Vec<VrpTimeWindow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time_per_vehicle: Option<Vec<i64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VrpStop {
    pub location_index: usize,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VrpRoute {
    pub vehicle_id: i64,
    pub stops: Vec<VrpStop>,
    /// Meters
    pub distance: i64,
    /// Seconds
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub load: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VrpResponse {
    pub status: String,
    #[serde(default)]
    pub routes: Vec<VrpRoute>,
    #[serde(default)]
    pub total_distance: i64,
    #[serde(default)]
    pub total_time: i64,
    #[serde(default)]
    pub message: Option<String>,
}

impl VrpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}
