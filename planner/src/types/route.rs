//! Route types

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::display::{format_clock, format_distance, format_duration, NO_TIME};

/// Whether a stop loads or unloads goods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopRole {
    Pickup,
    Delivery,
}

impl StopRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            StopRole::Pickup => "pickup",
            StopRole::Delivery => "delivery",
        }
    }
}

/// Where a leg's numbers came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    /// Measured by the directions provider
    Directions,
    /// Provider failed; value comes from the fallback table
    Fallback,
    /// Travel time carried over from a dashboard export; no distance
    Imported,
}

/// Travel segment between two consecutive stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub duration_seconds: u64,
    pub distance_meters: u64,
    pub source: EstimateSource,
}

impl Leg {
    pub fn measured(duration_seconds: u64, distance_meters: u64) -> Self {
        Self {
            duration_seconds,
            distance_meters,
            source: EstimateSource::Directions,
        }
    }

    pub fn fallback(minutes: u64, km: u64) -> Self {
        Self {
            duration_seconds: minutes * 60,
            distance_meters: km * 1000,
            source: EstimateSource::Fallback,
        }
    }

    pub fn imported(minutes: f64) -> Self {
        Self {
            duration_seconds: (minutes.max(0.0) * 60.0).round() as u64,
            distance_meters: 0,
            source: EstimateSource::Imported,
        }
    }

    pub fn is_estimated(&self) -> bool {
        self.source == EstimateSource::Fallback
    }
}

/// A stop on the route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub id: String,
    pub address: String,
    #[serde(rename = "type")]
    pub role: StopRole,
    /// Display time window, e.g. "8:00 - 9:00"
    pub time_window: String,
    pub items: Vec<String>,
    /// None for the first stop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival: Option<NaiveDateTime>,
    /// None for the last stop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDateTime>,
    /// Leg ending at this stop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg: Option<Leg>,
}

impl Stop {
    pub fn arrival_display(&self) -> String {
        self.arrival
            .map(|t| format_clock(t.time()))
            .unwrap_or_else(|| NO_TIME.to_string())
    }

    pub fn start_display(&self) -> String {
        self.start
            .map(|t| format_clock(t.time()))
            .unwrap_or_else(|| NO_TIME.to_string())
    }
}

/// Driver attached to a route after planning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverAssignment {
    pub driver_id: Option<String>,
    pub driver_name: String,
}

/// A closed depot → orders → depot route for one vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Shared by all routes produced in one planning run
    pub plan_id: Uuid,
    pub id: String,
    pub name: String,
    pub vehicle_id: String,
    pub vehicle_name: String,
    pub capacity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverAssignment>,
    pub stops: Vec<Stop>,
    pub departure: NaiveDateTime,
    pub total_distance_meters: u64,
    pub total_duration_seconds: u64,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Route {
    /// Orders served, i.e. stops minus the two depot visits
    pub fn order_count(&self) -> usize {
        self.stops.len().saturating_sub(2)
    }

    /// First and last stop share the depot address
    pub fn is_closed_loop(&self) -> bool {
        match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => self.stops.len() >= 2 && first.address == last.address,
            _ => false,
        }
    }

    /// Arrival back at the depot, once times are propagated
    pub fn arrival(&self) -> Option<NaiveDateTime> {
        self.stops.last().and_then(|s| s.arrival)
    }

    pub fn legs(&self) -> impl Iterator<Item = &Leg> {
        self.stops.iter().filter_map(|s| s.leg.as_ref())
    }

    pub fn estimated_leg_count(&self) -> usize {
        self.legs().filter(|l| l.is_estimated()).count()
    }

    pub fn total_distance_display(&self) -> String {
        format_distance(self.total_distance_meters)
    }

    pub fn estimated_time_display(&self) -> String {
        format_duration(self.total_duration_seconds)
    }

    pub fn departure_display(&self) -> String {
        format_clock(self.departure.time())
    }

    pub fn arrival_display(&self) -> String {
        self.arrival()
            .map(|t| format_clock(t.time()))
            .unwrap_or_else(|| NO_TIME.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stop(id: &str, address: &str) -> Stop {
        Stop {
            id: id.to_string(),
            address: address.to_string(),
            role: StopRole::Pickup,
            time_window: "8:00 - 9:00".to_string(),
            items: vec!["Depot".to_string()],
            arrival: None,
            start: None,
            leg: None,
        }
    }

    fn route(stops: Vec<Stop>) -> Route {
        Route {
            plan_id: Uuid::nil(),
            id: "route-1".to_string(),
            name: "Route.1".to_string(),
            vehicle_id: "1".to_string(),
            vehicle_name: "TN-01".to_string(),
            capacity: "Unknown".to_string(),
            driver: None,
            stops,
            departure: NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            total_distance_meters: 0,
            total_duration_seconds: 0,
            from: "Chennai Depot".to_string(),
            to: "Chennai Depot".to_string(),
            color: None,
        }
    }

    #[test]
    fn test_stop_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&StopRole::Delivery).unwrap(), "\"delivery\"");
        assert_eq!(StopRole::Pickup.as_str(), "pickup");
    }

    #[test]
    fn test_stop_serializes_role_as_type() {
        let json = serde_json::to_value(stop("stop-0-depot", "Chennai")).unwrap();
        assert_eq!(json["type"], "pickup");
        assert_eq!(json["timeWindow"], "8:00 - 9:00");
        assert!(json.get("arrival").is_none());
    }

    #[test]
    fn test_missing_times_display_as_dash() {
        let s = stop("stop-0-depot", "Chennai");
        assert_eq!(s.arrival_display(), "-");
        assert_eq!(s.start_display(), "-");
    }

    #[test]
    fn test_order_count_excludes_depot_visits() {
        let r = route(vec![
            stop("d", "Chennai"),
            stop("a", "Erode"),
            stop("b", "Salem"),
            stop("r", "Chennai"),
        ]);
        assert_eq!(r.order_count(), 2);
        assert!(r.is_closed_loop());
    }

    #[test]
    fn test_open_route_is_not_closed_loop() {
        let r = route(vec![stop("d", "Chennai"), stop("a", "Erode")]);
        assert!(!r.is_closed_loop());
        assert!(!route(vec![]).is_closed_loop());
    }

    #[test]
    fn test_estimated_leg_count() {
        let mut stops = vec![stop("d", "Chennai"), stop("a", "Erode"), stop("r", "Chennai")];
        stops[1].leg = Some(Leg::measured(3600, 40_000));
        stops[2].leg = Some(Leg::fallback(60, 40));
        let r = route(stops);
        assert_eq!(r.estimated_leg_count(), 1);
        assert_eq!(r.legs().count(), 2);
    }

    #[test]
    fn test_fallback_leg_units() {
        let leg = Leg::fallback(330, 350);
        assert_eq!(leg.duration_seconds, 19_800);
        assert_eq!(leg.distance_meters, 350_000);
        assert!(leg.is_estimated());
    }

    #[test]
    fn test_imported_leg_has_time_only() {
        let leg = Leg::imported(90.4);
        assert_eq!(leg.duration_seconds, 5_424);
        assert_eq!(leg.distance_meters, 0);
        assert_eq!(leg.source, EstimateSource::Imported);
        assert!(!leg.is_estimated());
        assert_eq!(serde_json::to_value(leg).unwrap()["source"], "imported");
    }
}
