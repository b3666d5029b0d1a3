//! Shapes served by the backend's `/analytics/*` endpoints

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Date range and metric shared by every analytics endpoint. The backend
/// defaults to the last 30 days when dates are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub metric: Option<String>,
    /// Only used by `/analytics/route-history` (1-100)
    pub limit: Option<u32>,
}

impl AnalyticsQuery {
    /// Query string including the leading `?`, or empty. The end date
    /// covers the whole day.
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::new();
        if let Some(start) = self.start_date {
            params.push(format!("start_date={}T00:00:00", start.format("%Y-%m-%d")));
        }
        if let Some(end) = self.end_date {
            params.push(format!("end_date={}T23:59:59", end.format("%Y-%m-%d")));
        }
        if let Some(metric) = &self.metric {
            params.push(format!("metric={}", urlencoding::encode(metric)));
        }
        if let Some(limit) = self.limit {
            params.push(format!("limit={}", limit));
        }

        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverHighlight {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub routes_completed: i64,
    #[serde(default)]
    pub on_time_rate: Option<f64>,
    #[serde(default)]
    pub total_distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleUtilization {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub distance_traveled: Option<f64>,
    #[serde(default)]
    pub utilization_rate: Option<f64>,
}

/// `GET /analytics/summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_routes: i64,
    /// Kilometers
    pub total_distance: f64,
    /// Minutes
    pub total_duration: f64,
    pub total_orders: i64,
    #[serde(default)]
    pub avg_efficiency_score: Option<f64>,
    #[serde(default)]
    pub top_performing_drivers: Vec<DriverHighlight>,
    #[serde(default)]
    pub vehicle_utilization: Vec<VehicleUtilization>,
}

/// One chart series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesDataset {
    pub label: String,
    #[serde(default)]
    pub data: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// Chart data of the route/driver/vehicle performance endpoints: one label
/// per point, one value per label in every dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesData {
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<TimeSeriesDataset>,
}

/// `GET /analytics/route-history` record (distance in km, times in minutes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendRouteRecord {
    pub id: i64,
    pub name: String,
    pub date_created: NaiveDateTime,
    #[serde(default)]
    pub total_distance: Option<f64>,
    #[serde(default)]
    pub total_duration: Option<f64>,
    #[serde(default)]
    pub total_orders: Option<i64>,
    #[serde(default)]
    pub driver_id: Option<i64>,
    #[serde(default)]
    pub vehicle_id: Option<i64>,
    #[serde(default)]
    pub depot_id: Option<i64>,
    #[serde(default)]
    pub actual_completion_time: Option<f64>,
    #[serde(default)]
    pub actual_distance: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}
