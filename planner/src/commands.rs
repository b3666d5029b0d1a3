//! Subcommand handlers

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cli::{
    AnalyticsReport, DateRange, DepotFields, DriverFields, HistoryAction, OrderFields, PlanArgs,
    RecordCommand, RecordFields, VehicleFields,
};
use crate::config::Config;
use crate::services::api::{ApiClient, Resource};
use crate::services::directions::{create_directions_provider, FallbackTable};
use crate::services::display::{format_distance, format_duration, parse_clock};
use crate::services::estimator::LegEstimator;
use crate::services::planning::{
    assign_driver, build_vrp_request, find_depot, select_orders, select_vehicles, PlanRequest,
    RoutePlanner,
};
use crate::services::rollup::compute_stats;
use crate::services::route_history::{read_legacy_file, RouteHistoryStore};
use crate::types::{
    AnalyticsQuery, AnalyticsSummary, Depot, Driver, HistoryStatus, Order,
    PlaceAutocompleteRequest, PlaceDetailsRequest, Route, RouteHistoryEntry, TimeSeriesData,
    Vehicle, VrpResponse,
};

fn api_client(config: &Config) -> Result<ApiClient> {
    ApiClient::new(&config.api_url, Duration::from_secs(config.request_timeout_secs))
}

pub async fn plan(config: &Config, args: PlanArgs, cancel: CancellationToken) -> Result<()> {
    let departure = match args.departure.as_deref() {
        Some(value) => Some(
            parse_clock(value)
                .with_context(|| format!("Invalid departure time '{}', expected e.g. 8:00 AM", value))?,
        ),
        None => None,
    };

    let estimator = LegEstimator::new(
        create_directions_provider(config.directions_config()),
        FallbackTable::default(),
    );
    let planner = RoutePlanner::new(
        api_client(config)?,
        estimator,
        config.service_duration_minutes,
        config.address_region.clone(),
    );

    let request = PlanRequest {
        order_ids: (!args.orders.is_empty()).then(|| args.orders.clone()),
        name: args.name.clone(),
        departure,
        ..PlanRequest::new(args.depot, args.vehicles.clone())
    };

    let routes = planner.plan(&request, &cancel).await?;

    if args.save {
        let store = RouteHistoryStore::open(&config.route_history_path);
        for route in &routes {
            store.save(route.clone())?;
        }
        info!("Saved {} routes to {}", routes.len(), store.path().display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&routes)?);
    } else {
        for route in &routes {
            print_itinerary(route);
        }
        print_stats(&routes);
    }
    Ok(())
}

pub fn stats(config: &Config) -> Result<()> {
    let store = RouteHistoryStore::open(&config.route_history_path);
    let routes: Vec<Route> = store.get_all().into_iter().map(|e| e.route).collect();
    print_stats(&routes);
    Ok(())
}

pub fn history(config: &Config, action: HistoryAction) -> Result<()> {
    let store = RouteHistoryStore::open(&config.route_history_path);

    match action {
        HistoryAction::List { status } => {
            let entries = match status {
                Some(s) => {
                    let status = HistoryStatus::parse(&s)
                        .with_context(|| format!("Unknown status '{}'", s))?;
                    store.by_status(status)
                }
                None => store.get_all(),
            };
            if entries.is_empty() {
                println!("No saved routes");
            }
            for entry in &entries {
                print_entry_summary(entry);
            }
        }
        HistoryAction::Show { id, plan } => {
            let entry = store
                .get(plan, &id)
                .with_context(|| format!("Route {} not found in history", id))?;
            print_entry_summary(&entry);
            print_itinerary(&entry.route);
        }
        HistoryAction::Delete { id, plan } => {
            let removed = store.delete(plan, &id)?;
            if removed == 0 {
                bail!("Route {} not found in history", id);
            }
            println!("Deleted {} saved route(s)", removed);
        }
        HistoryAction::Status { id, status, plan } => {
            let status = HistoryStatus::parse(&status)
                .with_context(|| format!("Unknown status '{}'", status))?;
            if !store.set_status(plan, &id, status)? {
                bail!("Route {} not found in history", id);
            }
            println!("{} is now {}", id, status.as_str());
        }
        HistoryAction::Import { file } => {
            let records = read_legacy_file(&file)?;
            let count = store.import_legacy(records)?;
            println!("Imported {} routes from {}", count, file.display());
        }
    }
    Ok(())
}

pub async fn assign(
    config: &Config,
    route_id: &str,
    plan: Option<uuid::Uuid>,
    driver_id: i64,
) -> Result<()> {
    let store = RouteHistoryStore::open(&config.route_history_path);
    let entry = store
        .get(plan, route_id)
        .with_context(|| format!("Route {} not found in history", route_id))?;

    let driver = api_client(config)?.drivers().get(driver_id).await?;

    let mut routes = vec![entry.route];
    assign_driver(&mut routes, route_id, &driver)?;
    for route in routes {
        store.save(route)?;
    }
    println!("Assigned {} to {}", driver.name, route_id);
    Ok(())
}

pub async fn solve(config: &Config, depot_id: i64, vehicle_ids: &[i64], order_ids: &[i64]) -> Result<()> {
    let api = api_client(config)?;
    let orders_api = api.orders();
    let vehicles_api = api.vehicles();
    let depots_api = api.depots();
    let (depots, vehicles, orders) =
        tokio::try_join!(depots_api.list(), vehicles_api.list(), orders_api.list())?;

    let depot = find_depot(&depots, depot_id)?;
    let vehicles = select_vehicles(&vehicles, vehicle_ids)?;
    let orders = select_orders(orders, (!order_ids.is_empty()).then_some(order_ids));

    let request = build_vrp_request(&depot, &orders, &vehicles);
    info!(
        "Solving VRP for {} locations with {} vehicles",
        request.locations.len(),
        request.num_vehicles
    );

    let response: VrpResponse = api.solve_vrp(&request).await?;
    if !response.is_ok() {
        warn!(
            "Failed to generate routes: {}",
            response.message.as_deref().unwrap_or("Unknown error")
        );
    }
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

pub async fn geocode(config: &Config, query: &str) -> Result<()> {
    let api = api_client(config)?;
    let suggestions = api
        .autocomplete(&PlaceAutocompleteRequest {
            input: query.to_string(),
            session_token: None,
        })
        .await?;

    let Some(best) = suggestions.predictions.first() else {
        bail!("No places found for '{}' ({})", query, suggestions.status);
    };
    for prediction in &suggestions.predictions {
        println!("{}  {}", prediction.place_id, prediction.description);
    }

    let details = api
        .place_details(&PlaceDetailsRequest {
            place_id: best.place_id.clone(),
            session_token: None,
        })
        .await?;
    match details.result {
        Some(place) => println!(
            "\n{}: {}, {}",
            place.formatted_address.as_deref().unwrap_or(&best.description),
            place.lat.map(|v| v.to_string()).unwrap_or_else(|| "?".into()),
            place.lng.map(|v| v.to_string()).unwrap_or_else(|| "?".into())
        ),
        None => warn!("No details for {} ({})", best.place_id, details.status),
    }
    Ok(())
}

pub async fn orders(config: &Config, command: RecordCommand<OrderFields>) -> Result<()> {
    let api = api_client(config)?;
    manage_records(api.orders(), command, |o: &Order| {
        format!(
            "{:>5}  {:<12} {:<20} {:<40} {}",
            id_text(o.id),
            o.order_number.as_deref().unwrap_or("-"),
            o.customer_name.as_deref().unwrap_or("-"),
            o.address,
            o.load.as_deref().unwrap_or("-")
        )
    })
    .await
}

pub async fn vehicles(config: &Config, command: RecordCommand<VehicleFields>) -> Result<()> {
    let api = api_client(config)?;
    manage_records(api.vehicles(), command, |v: &Vehicle| {
        format!(
            "{:>5}  {:<12} {:<12} {}",
            id_text(v.id),
            v.plate_number,
            v.vehicle_type,
            v.capacity.as_deref().unwrap_or("-")
        )
    })
    .await
}

pub async fn drivers(config: &Config, command: RecordCommand<DriverFields>) -> Result<()> {
    let api = api_client(config)?;
    manage_records(api.drivers(), command, |d: &Driver| {
        format!(
            "{:>5}  {:<24} {:<28} {}",
            id_text(d.id),
            d.name,
            d.email,
            d.phone.as_deref().unwrap_or("-")
        )
    })
    .await
}

pub async fn depots(config: &Config, command: RecordCommand<DepotFields>) -> Result<()> {
    let api = api_client(config)?;
    manage_records(api.depots(), command, |d: &Depot| {
        format!(
            "{:>5}  {:<24} {:<40} {}",
            id_text(d.id),
            d.name,
            d.address,
            d.status.as_deref().unwrap_or("-")
        )
    })
    .await
}

fn id_text(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Shared list/show/add/update/delete flow. Update reads the current record
/// and sends it back with the given fields changed.
async fn manage_records<T, F>(
    resource: Resource<'_, T>,
    command: RecordCommand<F>,
    describe: impl Fn(&T) -> String,
) -> Result<()>
where
    T: Serialize + DeserializeOwned + Default,
    F: RecordFields<T>,
{
    match command {
        RecordCommand::List => {
            let records = resource.list().await?;
            if records.is_empty() {
                println!("No records");
            }
            for record in &records {
                println!("{}", describe(record));
            }
        }
        RecordCommand::Show { id } => {
            let record = resource.get(id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        RecordCommand::Add(fields) => {
            let mut record = T::default();
            fields.apply(&mut record);
            let created = resource.create(&record).await?;
            println!("Created {}", describe(&created).trim());
        }
        RecordCommand::Update { id, fields } => {
            let mut record = resource.get(id).await?;
            fields.apply(&mut record);
            let updated = resource.update(id, &record).await?;
            println!("Updated {}", describe(&updated).trim());
        }
        RecordCommand::Delete { id } => {
            resource.delete(id).await?;
            info!("Deleted {}", resource.item_path(id));
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

pub async fn analytics(config: &Config, report: AnalyticsReport, range: DateRange, json: bool) -> Result<()> {
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            bail!("--from {} is after --to {}", from, to);
        }
    }
    let query = AnalyticsQuery {
        start_date: range.from,
        end_date: range.to,
        metric: report.metric().map(str::to_string),
        limit: match report {
            AnalyticsReport::History { limit } => Some(limit),
            _ => None,
        },
    };
    let api = api_client(config)?;

    match report {
        AnalyticsReport::Summary => {
            let summary = api.analytics_summary(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", render_summary(&summary));
            }
        }
        AnalyticsReport::Routes { .. } | AnalyticsReport::Drivers { .. } | AnalyticsReport::Vehicles { .. } => {
            let series = match report {
                AnalyticsReport::Routes { .. } => api.route_performance(&query).await?,
                AnalyticsReport::Drivers { .. } => api.driver_performance(&query).await?,
                _ => api.vehicle_usage(&query).await?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                print!("{}", render_time_series(&series));
            }
        }
        AnalyticsReport::History { .. } => {
            let records = api.backend_route_history(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for r in &records {
                    println!(
                        "{:>5}  {:<24} {}  {:>8} km  {:>6} min  {} orders",
                        r.id,
                        r.name,
                        r.date_created.format("%Y-%m-%d"),
                        r.total_distance.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".into()),
                        r.total_duration.map(|v| format!("{:.0}", v)).unwrap_or_else(|| "-".into()),
                        r.total_orders.unwrap_or(0)
                    );
                }
            }
        }
    }
    Ok(())
}

fn render_summary(summary: &AnalyticsSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Routes:     {}\n", summary.total_routes));
    out.push_str(&format!("Orders:     {}\n", summary.total_orders));
    out.push_str(&format!("Distance:   {:.1} km\n", summary.total_distance));
    out.push_str(&format!(
        "Duration:   {}\n",
        format_duration((summary.total_duration.max(0.0) * 60.0).round() as u64)
    ));
    if let Some(score) = summary.avg_efficiency_score {
        out.push_str(&format!("Efficiency: {:.1}\n", score));
    }
    if !summary.top_performing_drivers.is_empty() {
        out.push_str("\nTop drivers\n");
        for d in &summary.top_performing_drivers {
            out.push_str(&format!(
                "  {:<20} {:>3} routes  {:>5}% on time\n",
                d.name,
                d.routes_completed,
                d.on_time_rate.map(|v| format!("{:.0}", v)).unwrap_or_else(|| "-".into())
            ));
        }
    }
    if !summary.vehicle_utilization.is_empty() {
        out.push_str("\nVehicle utilization\n");
        for v in &summary.vehicle_utilization {
            out.push_str(&format!(
                "  {:<20} {:>5}%\n",
                v.name.as_deref().unwrap_or("-"),
                v.utilization_rate.map(|u| format!("{:.0}", u)).unwrap_or_else(|| "-".into())
            ));
        }
    }
    out
}

/// One row per label, one column per dataset
fn render_time_series(series: &TimeSeriesData) -> String {
    let mut out = format!("{:<16}", "");
    for dataset in &series.datasets {
        out.push_str(&format!(" {:>18}", dataset.label));
    }
    out.push('\n');
    for (i, label) in series.labels.iter().enumerate() {
        out.push_str(&format!("{:<16}", label));
        for dataset in &series.datasets {
            let value = dataset
                .data
                .get(i)
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(" {:>18}", value));
        }
        out.push('\n');
    }
    out
}

fn print_entry_summary(entry: &RouteHistoryEntry) {
    let route = &entry.route;
    println!(
        "{:<10} {:<16} {:<12} {:>8} {:>8}  {} -> {}  [{}] saved {} (plan {})",
        route.id,
        route.name,
        route.vehicle_name,
        route.total_distance_display(),
        route.estimated_time_display(),
        route.departure_display(),
        route.arrival_display(),
        entry.status.as_str(),
        entry.saved_at.format("%Y-%m-%d %H:%M"),
        route.plan_id
    );
}

fn print_itinerary(route: &Route) {
    let driver = route
        .driver
        .as_ref()
        .map(|d| d.driver_name.as_str())
        .unwrap_or("unassigned");
    println!();
    println!(
        "{} ({}, {}) driver: {}",
        route.name, route.vehicle_name, route.capacity, driver
    );
    println!(
        "  {} -> {}  {}  {}  departs {} {}",
        route.from,
        route.to,
        route.total_distance_display(),
        route.estimated_time_display(),
        route.departure.date(),
        route.departure_display()
    );

    for (n, stop) in route.stops.iter().enumerate() {
        let leg = stop
            .leg
            .map(|l| {
                format!(
                    "+{} {}{}",
                    format_duration(l.duration_seconds),
                    format_distance(l.distance_meters),
                    if l.is_estimated() { " (est.)" } else { "" }
                )
            })
            .unwrap_or_default();
        // Mark stops that fall on a later day than the departure
        let day = stop
            .arrival
            .or(stop.start)
            .filter(|t| t.date() > route.departure.date())
            .map(|t| format!(" [{}]", t.date()))
            .unwrap_or_default();
        println!(
            "  {:>2}. {:<9} {:<40} arr {:>8}  start {:>8}  window {:<13} {}{}",
            n + 1,
            stop.role.as_str(),
            stop.address,
            stop.arrival_display(),
            stop.start_display(),
            stop.time_window,
            leg,
            day
        );
    }
    if route.estimated_leg_count() > 0 {
        println!(
            "  {} of {} legs use fallback estimates",
            route.estimated_leg_count(),
            route.stops.len().saturating_sub(1)
        );
    }
}

fn print_stats(routes: &[Route]) {
    let stats = compute_stats(routes);
    println!();
    println!("Routes:   {}", stats.routes);
    println!("Orders:   {}", stats.orders);
    println!("Stops:    {}", stats.stops);
    println!("Distance: {} km", stats.distance_km);
    println!("Time:     {}", format_duration(stats.time_minutes * 60));
    if stats.estimated_legs > 0 {
        println!("Estimated legs: {}", stats.estimated_legs);
    }
}
