//! CLI argument parsing for the agriroute binary.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{Depot, Driver, Order, Vehicle};

#[derive(Parser)]
#[command(name = "agriroute", about = "Route planning for the agricultural delivery dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Plan routes for the selected depot and vehicles
    Plan(PlanArgs),
    /// Dashboard totals over the saved route history
    Stats,
    /// Inspect and manage saved routes
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Assign a driver to a saved route
    AssignDriver {
        /// Route id, e.g. route-1
        #[arg(long)]
        route: String,
        /// Plan id, when the route id is saved from several plans
        #[arg(long)]
        plan: Option<uuid::Uuid>,
        #[arg(long)]
        driver: i64,
    },
    /// Send the selection to the external VRP solver
    Solve {
        #[arg(long)]
        depot: i64,
        #[arg(long = "vehicle", required = true)]
        vehicles: Vec<i64>,
        /// Orders to include; all orders when omitted
        #[arg(long = "order")]
        orders: Vec<i64>,
    },
    /// Look up an address through the backend's geocoding proxy
    Geocode { query: String },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Manage vehicles
    Vehicles {
        #[command(subcommand)]
        action: VehicleAction,
    },
    /// Manage drivers
    Drivers {
        #[command(subcommand)]
        action: DriverAction,
    },
    /// Manage depots
    Depots {
        #[command(subcommand)]
        action: DepotAction,
    },
    /// Backend analytics over a date range (last 30 days by default)
    Analytics {
        #[command(subcommand)]
        report: AnalyticsReport,
        #[command(flatten)]
        range: DateRange,
        /// Print the raw response as JSON
        #[arg(long, global = true)]
        json: bool,
    },
}

/// List/show/add/update/delete for one record collection
pub enum RecordCommand<F> {
    List,
    Show { id: i64 },
    Add(F),
    Update { id: i64, fields: F },
    Delete { id: i64 },
}

/// Fields of a record that can be set from the command line. `update`
/// changes only the fields given.
pub trait RecordFields<T> {
    fn apply(self, record: &mut T);
}

macro_rules! record_action {
    ($name:ident, $fields:ty) => {
        #[derive(Subcommand)]
        pub enum $name {
            /// List all records
            List,
            /// Show one record as JSON
            Show { id: i64 },
            /// Create a record
            Add {
                #[command(flatten)]
                fields: $fields,
            },
            /// Change the given fields of a record
            Update {
                id: i64,
                #[command(flatten)]
                fields: $fields,
            },
            /// Delete a record
            Delete { id: i64 },
        }

        impl From<$name> for RecordCommand<$fields> {
            fn from(action: $name) -> Self {
                match action {
                    $name::List => RecordCommand::List,
                    $name::Show { id } => RecordCommand::Show { id },
                    $name::Add { fields } => RecordCommand::Add(fields),
                    $name::Update { id, fields } => RecordCommand::Update { id, fields },
                    $name::Delete { id } => RecordCommand::Delete { id },
                }
            }
        }
    };
}

record_action!(OrderAction, OrderFields);
record_action!(VehicleAction, VehicleFields);
record_action!(DriverAction, DriverFields);
record_action!(DepotAction, DepotFields);

fn set<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

#[derive(Args, Debug, Default)]
pub struct OrderFields {
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub order_number: Option<String>,
    #[arg(long)]
    pub customer_name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Window start, e.g. "9:00"
    #[arg(long)]
    pub start_time: Option<String>,
    #[arg(long)]
    pub end_time: Option<String>,
    #[arg(long)]
    pub duration: Option<String>,
    /// e.g. "100kg"
    #[arg(long)]
    pub load: Option<String>,
}

impl RecordFields<Order> for OrderFields {
    fn apply(self, order: &mut Order) {
        if let Some(address) = self.address {
            order.address = address;
        }
        set(&mut order.order_number, self.order_number);
        set(&mut order.customer_name, self.customer_name);
        set(&mut order.phone, self.phone);
        set(&mut order.email, self.email);
        set(&mut order.notes, self.notes);
        set(&mut order.start_time, self.start_time);
        set(&mut order.end_time, self.end_time);
        set(&mut order.duration, self.duration);
        set(&mut order.load, self.load);
    }
}

#[derive(Args, Debug, Default)]
pub struct VehicleFields {
    #[arg(long)]
    pub plate_number: Option<String>,
    #[arg(long = "type")]
    pub vehicle_type: Option<String>,
    #[arg(long)]
    pub capacity: Option<String>,
}

impl RecordFields<Vehicle> for VehicleFields {
    fn apply(self, vehicle: &mut Vehicle) {
        if let Some(plate) = self.plate_number {
            vehicle.plate_number = plate;
        }
        if let Some(kind) = self.vehicle_type {
            vehicle.vehicle_type = kind;
        }
        set(&mut vehicle.capacity, self.capacity);
    }
}

#[derive(Args, Debug, Default)]
pub struct DriverFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub license_number: Option<String>,
    #[arg(long)]
    pub experience: Option<String>,
}

impl RecordFields<Driver> for DriverFields {
    fn apply(self, driver: &mut Driver) {
        if let Some(name) = self.name {
            driver.name = name;
        }
        if let Some(email) = self.email {
            driver.email = email;
        }
        set(&mut driver.phone, self.phone);
        set(&mut driver.license_number, self.license_number);
        set(&mut driver.experience, self.experience);
    }
}

#[derive(Args, Debug, Default)]
pub struct DepotFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub capacity: Option<String>,
    /// e.g. "active"
    #[arg(long)]
    pub status: Option<String>,
}

impl RecordFields<Depot> for DepotFields {
    fn apply(self, depot: &mut Depot) {
        if let Some(name) = self.name {
            depot.name = name;
        }
        if let Some(address) = self.address {
            depot.address = address;
        }
        set(&mut depot.capacity, self.capacity);
        set(&mut depot.status, self.status);
    }
}

#[derive(Args, Debug, Default)]
pub struct DateRange {
    /// First day, YYYY-MM-DD
    #[arg(long, global = true)]
    pub from: Option<NaiveDate>,
    /// Last day, YYYY-MM-DD
    #[arg(long, global = true)]
    pub to: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum AnalyticsReport {
    /// Totals, top drivers and vehicle utilization
    Summary,
    /// Planned vs actual per route
    Routes {
        #[arg(long, value_enum, default_value_t = RouteMetric::Distance)]
        metric: RouteMetric,
    },
    /// Per driver
    Drivers {
        #[arg(long, value_enum, default_value_t = DriverMetric::OnTimeRate)]
        metric: DriverMetric,
    },
    /// Per vehicle
    Vehicles {
        #[arg(long, value_enum, default_value_t = VehicleMetric::Utilization)]
        metric: VehicleMetric,
    },
    /// Routes recorded by the backend, newest first
    History {
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
        limit: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RouteMetric {
    Distance,
    Duration,
    Efficiency,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum DriverMetric {
    OnTimeRate,
    AvgTime,
    Distance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VehicleMetric {
    Utilization,
    Distance,
    Fuel,
}

impl AnalyticsReport {
    /// Metric name as the backend expects it
    pub fn metric(&self) -> Option<&'static str> {
        match self {
            AnalyticsReport::Summary | AnalyticsReport::History { .. } => None,
            AnalyticsReport::Routes { metric } => Some(match metric {
                RouteMetric::Distance => "distance",
                RouteMetric::Duration => "duration",
                RouteMetric::Efficiency => "efficiency",
            }),
            AnalyticsReport::Drivers { metric } => Some(match metric {
                DriverMetric::OnTimeRate => "on_time_rate",
                DriverMetric::AvgTime => "avg_time",
                DriverMetric::Distance => "distance",
            }),
            AnalyticsReport::Vehicles { metric } => Some(match metric {
                VehicleMetric::Utilization => "utilization",
                VehicleMetric::Distance => "distance",
                VehicleMetric::Fuel => "fuel",
            }),
        }
    }
}

#[derive(Args)]
pub struct PlanArgs {
    #[arg(long)]
    pub depot: i64,
    #[arg(long = "vehicle", required = true)]
    pub vehicles: Vec<i64>,
    /// Orders to include; all orders when omitted
    #[arg(long = "order")]
    pub orders: Vec<i64>,
    /// Route name prefix ("{name}.1", "{name}.2", ...)
    #[arg(long)]
    pub name: Option<String>,
    /// Departure of the first route, e.g. "8:00 AM"
    #[arg(long)]
    pub departure: Option<String>,
    /// Save planned routes to the history
    #[arg(long)]
    pub save: bool,
    /// Print routes as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List saved routes
    List {
        /// completed, planned or in-progress
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one saved route with its itinerary
    Show {
        id: String,
        #[arg(long)]
        plan: Option<uuid::Uuid>,
    },
    /// Delete a saved route
    Delete {
        id: String,
        #[arg(long)]
        plan: Option<uuid::Uuid>,
    },
    /// Change the status of a saved route
    Status {
        id: String,
        /// completed, planned or in-progress
        status: String,
        #[arg(long)]
        plan: Option<uuid::Uuid>,
    },
    /// Import routes exported by the browser dashboard
    Import { file: PathBuf },
}
