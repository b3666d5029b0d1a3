//! Dashboard statistics over a set of routes

use serde::Serialize;

use super::display::distance_km;
use crate::types::Route;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub routes: usize,
    /// Sum of per-route order counts (stops minus the two depot visits)
    pub orders: usize,
    pub stops: usize,
    /// Sum of per-route distances, each rounded to whole kilometers
    pub distance_km: u64,
    /// Sum of per-route travel times, each rounded to whole minutes
    pub time_minutes: u64,
    /// Legs whose values came from the fallback table
    pub estimated_legs: usize,
}

pub fn compute_stats(routes: &[Route]) -> DashboardStats {
    let stops: usize = routes.iter().map(|r| r.stops.len()).sum();

    DashboardStats {
        routes: routes.len(),
        orders: routes.iter().map(|r| r.order_count()).sum(),
        stops,
        distance_km: routes.iter().map(|r| distance_km(r.total_distance_meters)).sum(),
        time_minutes: routes
            .iter()
            .map(|r| (r.total_duration_seconds as f64 / 60.0).round() as u64)
            .sum(),
        estimated_legs: routes.iter().map(|r| r.estimated_leg_count()).sum(),
    }
}
