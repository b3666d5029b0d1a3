//! Stop sequencing: turns a depot, a slice of orders and a vehicle into a
//! closed route `[depot, order₁ … orderₙ, depot]`.
//!
//! Orders are split across vehicles in contiguous, equally sized chunks in
//! the order they were fetched. Vehicle and order capacities are not
//! consulted; balancing by load is left to the external solver.

use anyhow::{bail, Result};
use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::defaults::{DEPOT_TIME_WINDOW, ROUTE_COLORS, SAMPLE_CITIES};
use crate::types::{Depot, Order, Route, Stop, StopRole, Vehicle};

/// Settings shared by every route of one planning run
#[derive(Debug, Clone)]
pub struct SequencerOptions {
    pub plan_id: Uuid,
    /// Route names become "{prefix}.{n}"; "Route" when absent
    pub name_prefix: Option<String>,
    /// Departure of the first route; route i leaves i hours later
    pub base_departure: NaiveDateTime,
    /// Appended to the depot address when missing, e.g. "India"
    pub region_suffix: Option<String>,
}

/// Everything needed to assemble one route
#[derive(Debug, Clone)]
pub struct RouteSeed<'a> {
    pub plan_id: Uuid,
    pub index: usize,
    pub depot: &'a Depot,
    pub orders: &'a [Order],
    /// Position of `orders[0]` in the full order list
    pub order_offset: usize,
    pub vehicle: &'a Vehicle,
    pub name_prefix: Option<&'a str>,
    pub departure: NaiveDateTime,
    pub region_suffix: Option<&'a str>,
}

/// Split `orders` into contiguous chunks of `ceil(len / vehicle_count)`.
///
/// 7 orders over 3 vehicles gives `[3, 3, 1]`. Fewer chunks than vehicles
/// come back when there are not enough orders to go round.
pub fn partition_orders<T>(orders: &[T], vehicle_count: usize) -> Vec<&[T]> {
    if vehicle_count == 0 || orders.is_empty() {
        return Vec::new();
    }
    let chunk_size = orders.len().div_ceil(vehicle_count);
    orders.chunks(chunk_size).collect()
}

/// The order's address, or a sample city picked cyclically by `position`.
pub fn order_address(order: &Order, position: usize) -> String {
    match order.usable_address() {
        Some(address) => address.to_string(),
        None => {
            let city = SAMPLE_CITIES[position % SAMPLE_CITIES.len()];
            warn!(
                "Order {:?} has no address, substituting sample city {}",
                order.id, city
            );
            city.to_string()
        }
    }
}

/// Append the region to an address unless it already mentions it.
pub fn with_region(address: &str, region: Option<&str>) -> String {
    match region.map(str::trim) {
        Some(region) if !region.is_empty() && !address.contains(region) => {
            format!("{}, {}", address, region)
        }
        _ => address.to_string(),
    }
}

fn order_time_window(order: &Order, stop_index: usize) -> String {
    match (order.start_time.as_deref(), order.end_time.as_deref()) {
        (Some(start), Some(end)) => format!("{} - {}", start, end),
        _ => format!("{}:00 - {}:00", 8 + stop_index, 9 + stop_index),
    }
}

/// Assemble a closed route. Times and totals stay empty until the
/// schedule is propagated.
pub fn build_route(seed: &RouteSeed<'_>) -> Result<Route> {
    let depot_address = seed.depot.address.trim();
    if depot_address.is_empty() {
        bail!("Depot '{}' has no address", seed.depot.name);
    }
    let depot_address = with_region(depot_address, seed.region_suffix);
    let i = seed.index;

    let depot_stop = Stop {
        id: format!("stop-{}-depot", i),
        address: depot_address.clone(),
        role: StopRole::Pickup,
        time_window: DEPOT_TIME_WINDOW.to_string(),
        items: vec!["Depot".to_string()],
        arrival: None,
        start: None,
        leg: None,
    };

    let mut stops = Vec::with_capacity(seed.orders.len() + 2);
    stops.push(depot_stop.clone());

    for (j, order) in seed.orders.iter().enumerate() {
        stops.push(Stop {
            id: format!("stop-{}-{}", i, j),
            address: order_address(order, seed.order_offset + j),
            role: if j % 2 == 0 { StopRole::Pickup } else { StopRole::Delivery },
            time_window: order_time_window(order, j),
            items: vec![order.load.clone().unwrap_or_else(|| "Items".to_string())],
            arrival: None,
            start: None,
            leg: None,
        });
    }

    stops.push(Stop {
        id: format!("stop-{}-depot-return", i),
        role: StopRole::Delivery,
        ..depot_stop
    });

    let depot_name = if seed.depot.name.trim().is_empty() {
        "Depot".to_string()
    } else {
        seed.depot.name.clone()
    };
    let vehicle_name = if seed.vehicle.plate_number.trim().is_empty() {
        format!("Vehicle {}", i + 1)
    } else {
        seed.vehicle.plate_number.clone()
    };

    debug!(
        "Sequenced route {} with {} orders for vehicle {}",
        i + 1,
        seed.orders.len(),
        vehicle_name
    );

    Ok(Route {
        plan_id: seed.plan_id,
        id: format!("route-{}", i + 1),
        name: format!("{}.{}", seed.name_prefix.unwrap_or("Route"), i + 1),
        vehicle_id: seed.vehicle.id.map(|id| id.to_string()).unwrap_or_default(),
        vehicle_name,
        capacity: seed
            .vehicle
            .capacity
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        driver: None,
        stops,
        departure: seed.departure,
        total_distance_meters: 0,
        total_duration_seconds: 0,
        from: depot_name.clone(),
        to: depot_name,
        color: Some(ROUTE_COLORS[i % ROUTE_COLORS.len()].to_string()),
    })
}

/// Partition `orders` across `vehicles` and build one route per non-empty
/// chunk, in vehicle order.
pub fn plan_routes(
    depot: &Depot,
    orders: &[Order],
    vehicles: &[Vehicle],
    options: &SequencerOptions,
) -> Result<Vec<Route>> {
    if depot.address.trim().is_empty() {
        bail!("Depot '{}' has no address", depot.name);
    }

    let chunks = partition_orders(orders, vehicles.len());
    let mut routes = Vec::with_capacity(chunks.len());
    let mut offset = 0;

    for (index, vehicle) in vehicles.iter().enumerate() {
        let Some(chunk) = chunks.get(index) else {
            warn!(
                "No orders left for vehicle {} (route {}), skipping",
                vehicle.plate_number,
                index + 1
            );
            continue;
        };

        let seed = RouteSeed {
            plan_id: options.plan_id,
            index,
            depot,
            orders: chunk,
            order_offset: offset,
            vehicle,
            name_prefix: options.name_prefix.as_deref(),
            departure: options.base_departure + Duration::hours(index as i64),
            region_suffix: options.region_suffix.as_deref(),
        };
        routes.push(build_route(&seed)?);
        offset += chunk.len();
    }

    Ok(routes)
}
