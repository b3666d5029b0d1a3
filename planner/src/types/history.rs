//! Saved route history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Route, StopRole};

/// Lifecycle tag of a saved route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryStatus {
    Completed,
    Planned,
    InProgress,
}

impl HistoryStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            HistoryStatus::Completed => "completed",
            HistoryStatus::Planned => "planned",
            HistoryStatus::InProgress => "in-progress",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "completed" => Some(HistoryStatus::Completed),
            "planned" => Some(HistoryStatus::Planned),
            "in-progress" | "in_progress" => Some(HistoryStatus::InProgress),
            _ => None,
        }
    }
}

/// A route persisted on explicit user action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteHistoryEntry {
    #[serde(flatten)]
    pub route: Route,
    pub saved_at: DateTime<Utc>,
    pub status: HistoryStatus,
}

/// Stop as exported by the browser dashboard
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStop {
    pub id: String,
    pub address: String,
    #[serde(rename = "type")]
    pub role: StopRole,
    #[serde(default)]
    pub time_window: String,
    #[serde(default)]
    pub items: Vec<String>,
    pub calculated_arrival_time: Option<String>,
    pub calculated_start_time: Option<String>,
    /// Minutes
    pub calculated_travel_time: Option<f64>,
}

/// Route record as exported by the browser dashboard, where distance and
/// times are display strings ("45 km", "2h 30m", "8:00 AM")
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRouteRecord {
    pub id: String,
    pub route_name: String,
    #[serde(default)]
    pub vehicle_name: String,
    #[serde(default)]
    pub vehicle_id: String,
    #[serde(default)]
    pub capacity: Option<String>,
    pub driver_id: Option<String>,
    pub driver_name: Option<String>,
    #[serde(default)]
    pub total_distance: String,
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default)]
    pub departure_time: String,
    #[serde(default)]
    pub arrival_time: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub stops: Vec<LegacyStop>,
    pub color: Option<String>,
    pub date: DateTime<Utc>,
    pub status: HistoryStatus,
}
