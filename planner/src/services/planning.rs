//! Planning service: fetch dashboard data, sequence routes, estimate legs
//! and propagate the schedule.

use chrono::{Local, NaiveDate, NaiveTime};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::api::{ApiClient, ApiError};
use super::estimator::LegEstimator;
use super::schedule::propagate_schedule;
use super::sequencer::{plan_routes, SequencerOptions};
use crate::defaults::default_departure;
use crate::types::{
    Coordinates, Depot, Driver, DriverAssignment, Order, Route, Vehicle, VrpLocation, VrpRequest,
};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Planning cancelled")]
    Cancelled,

    #[error("Selected depot {0} not found")]
    DepotNotFound(i64),

    #[error("Selected vehicle {0} not found")]
    VehicleNotFound(i64),

    #[error("No vehicles selected")]
    NoVehicles,

    #[error("No orders to plan")]
    NoOrders,

    #[error("Route {0} not found")]
    RouteNotFound(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// What to plan
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub depot_id: i64,
    pub vehicle_ids: Vec<i64>,
    /// All orders when absent
    pub order_ids: Option<Vec<i64>>,
    pub name: Option<String>,
    pub departure: Option<NaiveTime>,
    /// Today when absent
    pub date: Option<NaiveDate>,
}

impl PlanRequest {
    pub fn new(depot_id: i64, vehicle_ids: Vec<i64>) -> Self {
        Self {
            depot_id,
            vehicle_ids,
            order_ids: None,
            name: None,
            departure: None,
            date: None,
        }
    }
}

/// Selected vehicles, in the order they were asked for
pub fn select_vehicles(vehicles: &[Vehicle], ids: &[i64]) -> Result<Vec<Vehicle>, PlanError> {
    if ids.is_empty() {
        return Err(PlanError::NoVehicles);
    }
    ids.iter()
        .map(|id| {
            vehicles
                .iter()
                .find(|v| v.id == Some(*id))
                .cloned()
                .ok_or(PlanError::VehicleNotFound(*id))
        })
        .collect()
}

/// Selected orders in fetch order; unknown ids are ignored
pub fn select_orders(orders: Vec<Order>, ids: Option<&[i64]>) -> Vec<Order> {
    match ids {
        None => orders,
        Some(ids) => orders
            .into_iter()
            .filter(|o| o.id.is_some_and(|id| ids.contains(&id)))
            .collect(),
    }
}

pub fn find_depot(depots: &[Depot], id: i64) -> Result<Depot, PlanError> {
    depots
        .iter()
        .find(|d| d.id == Some(id))
        .cloned()
        .ok_or(PlanError::DepotNotFound(id))
}

/// Set the driver of one route
pub fn assign_driver(routes: &mut [Route], route_id: &str, driver: &Driver) -> Result<(), PlanError> {
    let route = routes
        .iter_mut()
        .find(|r| r.id == route_id)
        .ok_or_else(|| PlanError::RouteNotFound(route_id.to_string()))?;

    route.driver = Some(DriverAssignment {
        driver_id: driver.id.map(|id| id.to_string()),
        driver_name: driver.name.clone(),
    });
    info!("Assigned driver {} to {}", driver.name, route.name);
    Ok(())
}

fn vrp_location(address: &str, coordinates: Option<Coordinates>) -> VrpLocation {
    VrpLocation {
        address: address.to_string(),
        lat: coordinates.map(|c| c.lat),
        lng: coordinates.map(|c| c.lng),
    }
}

/// Build the request for the external VRP solver. The depot is location 0.
/// Capacities are sent only when every vehicle has a positive capacity,
/// demands only when every order has a positive load.
pub fn build_vrp_request(depot: &Depot, orders: &[Order], vehicles: &[Vehicle]) -> VrpRequest {
    let locations = std::iter::once(vrp_location(&depot.address, depot.coordinates()))
        .chain(orders.iter().map(|o| vrp_location(&o.address, o.coordinates())))
        .collect();

    let capacities: Vec<i64> = vehicles
        .iter()
        .map(|v| v.capacity_units().unwrap_or(0))
        .collect();
    let demands: Vec<i64> = orders.iter().map(|o| o.demand().unwrap_or(0)).collect();

    VrpRequest {
        locations,
        num_vehicles: vehicles.len(),
        depot_index: 0,
        vehicle_capacities: capacities.iter().all(|c| *c > 0).then_some(capacities),
        demands: demands
            .iter()
            .all(|d| *d > 0)
            .then(|| std::iter::once(0).chain(demands.iter().copied()).collect()),
        time_windows: None,
        max_time_per_vehicle: None,
    }
}

pub struct RoutePlanner {
    api: ApiClient,
    estimator: LegEstimator,
    service_minutes: u32,
    region_suffix: Option<String>,
}

impl RoutePlanner {
    pub fn new(
        api: ApiClient,
        estimator: LegEstimator,
        service_minutes: u32,
        region_suffix: Option<String>,
    ) -> Self {
        Self {
            api,
            estimator,
            service_minutes,
            region_suffix,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Fetch depots, vehicles and orders and plan the requested routes
    pub async fn plan(
        &self,
        request: &PlanRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Route>, PlanError> {
        let orders_api = self.api.orders();
        let vehicles_api = self.api.vehicles();
        let depots_api = self.api.depots();

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PlanError::Cancelled),
            fetched = async {
                tokio::try_join!(depots_api.list(), vehicles_api.list(), orders_api.list())
            } => fetched,
        };
        let (depots, vehicles, orders) = fetched?;
        debug!(
            "Fetched {} depots, {} vehicles, {} orders",
            depots.len(),
            vehicles.len(),
            orders.len()
        );

        self.plan_with_data(&depots, &vehicles, orders, request, cancel)
            .await
    }

    /// Plan from already loaded records
    pub async fn plan_with_data(
        &self,
        depots: &[Depot],
        vehicles: &[Vehicle],
        orders: Vec<Order>,
        request: &PlanRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Route>, PlanError> {
        let depot = find_depot(depots, request.depot_id)?;
        let vehicles = select_vehicles(vehicles, &request.vehicle_ids)?;
        let orders = select_orders(orders, request.order_ids.as_deref());
        if orders.is_empty() {
            return Err(PlanError::NoOrders);
        }

        let date = request.date.unwrap_or_else(|| Local::now().date_naive());
        let departure = request.departure.unwrap_or_else(default_departure);
        let options = SequencerOptions {
            plan_id: Uuid::new_v4(),
            name_prefix: request.name.clone(),
            base_departure: date.and_time(departure),
            region_suffix: self.region_suffix.clone(),
        };

        let mut routes = plan_routes(&depot, &orders, &vehicles, &options)?;
        info!(
            "Sequenced {} orders into {} routes (plan {})",
            orders.len(),
            routes.len(),
            options.plan_id
        );

        self.schedule_routes(&mut routes, cancel).await?;
        Ok(routes)
    }

    /// Estimate every leg and propagate arrival/start times
    pub async fn schedule_routes(
        &self,
        routes: &mut [Route],
        cancel: &CancellationToken,
    ) -> Result<(), PlanError> {
        for route in routes.iter_mut() {
            let addresses: Vec<String> = route.stops.iter().map(|s| s.address.clone()).collect();
            let legs = self.estimator.estimate(&addresses, cancel).await?;
            propagate_schedule(route, &legs, self.service_minutes)?;

            info!(
                "{}: {} stops, {}, {} via {} ({} estimated legs)",
                route.name,
                route.stops.len(),
                route.total_distance_display(),
                route.estimated_time_display(),
                self.estimator.provider_name(),
                route.estimated_leg_count()
            );
        }
        Ok(())
    }
}
