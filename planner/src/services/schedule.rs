//! Arrival/start time propagation along a route.
//!
//! One sequential pass over the stops: each stop's arrival is the previous
//! stop's start plus the leg between them, and its start is the arrival
//! plus a fixed service time. The first stop has no arrival (the clock
//! starts at the route's departure); the last stop has no start.

use anyhow::{bail, Result};
use chrono::Duration;

use crate::types::{Leg, Route};

/// Write arrival/start times, legs and totals onto `route`.
///
/// `legs[i]` is the leg from `stops[i]` to `stops[i + 1]`. Routes with
/// fewer than two stops are left unchanged.
pub fn propagate_schedule(route: &mut Route, legs: &[Leg], service_minutes: u32) -> Result<()> {
    let n = route.stops.len();
    if n < 2 {
        return Ok(());
    }
    if legs.len() != n - 1 {
        bail!(
            "Route {} has {} stops but {} legs were given",
            route.id,
            n,
            legs.len()
        );
    }

    let service = Duration::minutes(i64::from(service_minutes));
    let mut cursor = route.departure;

    let first = &mut route.stops[0];
    first.arrival = None;
    first.start = Some(cursor);
    first.leg = None;

    for (i, leg) in legs.iter().enumerate() {
        let stop = &mut route.stops[i + 1];
        let arrival = cursor + Duration::seconds(leg.duration_seconds as i64);
        stop.arrival = Some(arrival);
        stop.leg = Some(*leg);

        if i + 1 == n - 1 {
            stop.start = None;
        } else {
            let start = arrival + service;
            stop.start = Some(start);
            cursor = start;
        }
    }

    route.total_distance_meters = legs.iter().map(|l| l.distance_meters).sum();
    route.total_duration_seconds = legs.iter().map(|l| l.duration_seconds).sum();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Stop, StopRole};
    use chrono::{NaiveDate, NaiveDateTime};
    use uuid::Uuid;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn route_with(addresses: &[&str], departure: NaiveDateTime) -> Route {
        Route {
            plan_id: Uuid::nil(),
            id: "route-1".to_string(),
            name: "Route.1".to_string(),
            vehicle_id: "1".to_string(),
            vehicle_name: "TN-01".to_string(),
            capacity: "Unknown".to_string(),
            driver: None,
            stops: addresses
                .iter()
                .enumerate()
                .map(|(i, a)| Stop {
                    id: format!("stop-0-{}", i),
                    address: a.to_string(),
                    role: StopRole::Pickup,
                    time_window: "8:00 - 9:00".to_string(),
                    items: vec![],
                    arrival: None,
                    start: None,
                    leg: None,
                })
                .collect(),
            departure,
            total_distance_meters: 0,
            total_duration_seconds: 0,
            from: "Depot".to_string(),
            to: "Depot".to_string(),
            color: None,
        }
    }

    fn minutes(m: u64) -> Leg {
        Leg::measured(m * 60, m * 1000)
    }

    #[test]
    fn test_first_and_last_stop_sentinels() {
        let mut route = route_with(&["Chennai", "Erode", "Salem", "Chennai"], at(2, 8, 0));
        propagate_schedule(&mut route, &[minutes(60), minutes(60), minutes(60)], 30).unwrap();

        let stops = &route.stops;
        assert_eq!(stops[0].arrival_display(), "-");
        assert_eq!(stops[0].start_display(), "8:00 AM");
        assert_eq!(stops[3].start_display(), "-");
        for stop in &stops[1..3] {
            assert!(stop.arrival.is_some());
            assert!(stop.start.is_some());
        }
    }

    #[test]
    fn test_ninety_minute_leg_rolls_the_hour() {
        let mut route = route_with(&["Chennai", "Erode", "Chennai"], at(2, 8, 0));
        propagate_schedule(&mut route, &[minutes(90), minutes(45)], 30).unwrap();

        assert_eq!(route.stops[1].arrival_display(), "9:30 AM");
        assert_eq!(route.stops[1].start_display(), "10:00 AM");
        assert_eq!(route.stops[2].arrival_display(), "10:45 AM");
        assert_eq!(route.arrival_display(), "10:45 AM");
    }

    #[test]
    fn test_midnight_crossing_keeps_the_date() {
        let mut route = route_with(&["Chennai", "Chennai"], at(2, 23, 45));
        propagate_schedule(&mut route, &[minutes(30)], 30).unwrap();

        let arrival = route.stops[1].arrival.unwrap();
        assert_eq!(arrival, at(3, 0, 15));
        // The 12-hour display has no date: the day change is not visible.
        assert_eq!(route.stops[1].arrival_display(), "12:15 AM");
    }

    #[test]
    fn test_each_stop_depends_on_previous_start() {
        let mut route = route_with(&["D", "A", "B", "C", "D"], at(2, 8, 0));
        let legs = [minutes(10), minutes(20), minutes(30), minutes(40)];
        propagate_schedule(&mut route, &legs, 30).unwrap();

        // 8:00 +10 → 8:10, +30 → 8:40, +20 → 9:00, +30 → 9:30,
        // +30 → 10:00, +30 → 10:30, +40 → 11:10
        let s = &route.stops;
        assert_eq!(s[1].arrival, Some(at(2, 8, 10)));
        assert_eq!(s[2].arrival, Some(at(2, 9, 0)));
        assert_eq!(s[3].start, Some(at(2, 10, 30)));
        assert_eq!(s[4].arrival, Some(at(2, 11, 10)));
    }

    #[test]
    fn test_custom_service_time() {
        let mut route = route_with(&["D", "A", "D"], at(2, 8, 0));
        propagate_schedule(&mut route, &[minutes(60), minutes(60)], 45).unwrap();
        assert_eq!(route.stops[1].start, Some(at(2, 9, 45)));
        assert_eq!(route.stops[2].arrival, Some(at(2, 10, 45)));
    }

    #[test]
    fn test_totals_and_legs_recorded() {
        let mut route = route_with(&["D", "A", "D"], at(2, 8, 0));
        let legs = [Leg::measured(3_600, 40_000), Leg::fallback(60, 40)];
        propagate_schedule(&mut route, &legs, 30).unwrap();

        assert_eq!(route.total_distance_meters, 80_000);
        assert_eq!(route.total_duration_seconds, 7_200);
        assert!(route.stops[0].leg.is_none());
        assert_eq!(route.stops[2].leg, Some(legs[1]));
        assert_eq!(route.estimated_leg_count(), 1);
        assert_eq!(route.total_distance_display(), "80 km");
        assert_eq!(route.estimated_time_display(), "2h 0m");
    }

    #[test]
    fn test_short_route_unchanged() {
        let mut route = route_with(&["D"], at(2, 8, 0));
        let before = route.clone();
        propagate_schedule(&mut route, &[], 30).unwrap();
        assert_eq!(route, before);
    }

    #[test]
    fn test_leg_count_mismatch_rejected() {
        let mut route = route_with(&["D", "A", "D"], at(2, 8, 0));
        assert!(propagate_schedule(&mut route, &[minutes(10)], 30).is_err());
    }
}
