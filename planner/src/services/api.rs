//! Client for the dashboard's REST backend
//!
//! Every endpoint speaks JSON. Responses with another content type (an HTML
//! error page from a proxy, for instance) are reported as such before the
//! status is looked at; failed requests carry the backend's `detail` message.

use std::marker::PhantomData;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::types::{
    AnalyticsQuery, AnalyticsSummary, BackendRouteRecord, Depot, Driver, Order,
    PlaceAutocompleteRequest, PlaceAutocompleteResponse, PlaceDetailsRequest,
    PlaceDetailsResponse, TimeSeriesData, Vehicle, VrpRequest, VrpResponse,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Could not connect to server. Please ensure the backend is running at {base_url}")]
    Connection {
        base_url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server returned non-JSON response ({content_type}). Backend may not be running correctly.")]
    NonJson { content_type: String },

    #[error("{detail} (HTTP {status})")]
    Status { status: u16, detail: String },

    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Empty response from {endpoint}")]
    EmptyBody { endpoint: String },
}

/// `detail` field of a backend error body
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Extract the message of a failed response body
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { detail: Some(serde_json::Value::String(s)) }) => s,
        Ok(ErrorBody { detail: Some(other) }) => other.to_string(),
        _ => UNKNOWN_ERROR.to_string(),
    }
}

/// A missing content type is accepted; anything present must be JSON.
fn check_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) if !ct.contains("application/json") => Err(ApiError::NonJson {
            content_type: ct.to_string(),
        }),
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Send a request and decode the JSON answer. `204 No Content` gives `None`.
    pub async fn request<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(endpoint);
        debug!("{} {}", method, url);

        let mut builder = self.client.request(method, &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|source| {
            error!("Network error when connecting to {}", url);
            ApiError::Connection {
                base_url: self.base_url.clone(),
                source,
            }
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        check_content_type(content_type.as_deref())?;

        let text = response.text().await.map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: error_detail(&text),
            });
        }

        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ApiError::Decode {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })
    }

    async fn request_body<B, T>(&self, method: Method, endpoint: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(method, endpoint, body)
            .await?
            .ok_or_else(|| ApiError::EmptyBody {
                endpoint: endpoint.to_string(),
            })
    }

    pub fn orders(&self) -> Resource<'_, Order> {
        Resource::new(self, "/orders")
    }

    pub fn vehicles(&self) -> Resource<'_, Vehicle> {
        Resource::new(self, "/vehicles")
    }

    pub fn drivers(&self) -> Resource<'_, Driver> {
        Resource::new(self, "/drivers")
    }

    pub fn depots(&self) -> Resource<'_, Depot> {
        Resource::new(self, "/depots")
    }

    pub async fn autocomplete(
        &self,
        request: &PlaceAutocompleteRequest,
    ) -> Result<PlaceAutocompleteResponse, ApiError> {
        self.request_body(Method::POST, "/geocoding/autocomplete", Some(request))
            .await
    }

    pub async fn place_details(
        &self,
        request: &PlaceDetailsRequest,
    ) -> Result<PlaceDetailsResponse, ApiError> {
        self.request_body(Method::POST, "/geocoding/place-details", Some(request))
            .await
    }

    /// Forward a request to the external VRP solver
    pub async fn solve_vrp(&self, request: &VrpRequest) -> Result<VrpResponse, ApiError> {
        self.request_body(Method::POST, "/vrp/solve", Some(request)).await
    }

    async fn analytics<T: DeserializeOwned>(&self, path: &str, query: &AnalyticsQuery) -> Result<T, ApiError> {
        let endpoint = format!("/analytics/{}{}", path, query.to_query_string());
        self.request_body::<(), T>(Method::GET, &endpoint, None).await
    }

    pub async fn analytics_summary(&self, query: &AnalyticsQuery) -> Result<AnalyticsSummary, ApiError> {
        self.analytics("summary", query).await
    }

    /// Planned vs actual per route; metric `distance`, `duration` or `efficiency`
    pub async fn route_performance(&self, query: &AnalyticsQuery) -> Result<TimeSeriesData, ApiError> {
        self.analytics("route-performance", query).await
    }

    /// Per driver; metric `on_time_rate`, `avg_time` or `distance`
    pub async fn driver_performance(&self, query: &AnalyticsQuery) -> Result<TimeSeriesData, ApiError> {
        self.analytics("driver-performance", query).await
    }

    /// Per vehicle; metric `utilization`, `distance` or `fuel`
    pub async fn vehicle_usage(&self, query: &AnalyticsQuery) -> Result<TimeSeriesData, ApiError> {
        self.analytics("vehicle-usage", query).await
    }

    /// Routes recorded by the backend, newest first
    pub async fn backend_route_history(
        &self,
        query: &AnalyticsQuery,
    ) -> Result<Vec<BackendRouteRecord>, ApiError> {
        self.analytics("route-history", query).await
    }
}

/// CRUD endpoints of one record collection
pub struct Resource<'a, T> {
    api: &'a ApiClient,
    path: &'static str,
    _record: PhantomData<T>,
}

impl<'a, T> Resource<'a, T>
where
    T: Serialize + DeserializeOwned,
{
    fn new(api: &'a ApiClient, path: &'static str) -> Self {
        Self {
            api,
            path,
            _record: PhantomData,
        }
    }

    pub fn item_path(&self, id: i64) -> String {
        format!("{}/{}", self.path, id)
    }

    pub async fn list(&self) -> Result<Vec<T>, ApiError> {
        Ok(self
            .api
            .request::<(), Vec<T>>(Method::GET, self.path, None)
            .await?
            .unwrap_or_default())
    }

    pub async fn get(&self, id: i64) -> Result<T, ApiError> {
        self.api
            .request_body::<(), T>(Method::GET, &self.item_path(id), None)
            .await
    }

    pub async fn create(&self, record: &T) -> Result<T, ApiError> {
        self.api
            .request_body(Method::POST, self.path, Some(record))
            .await
    }

    pub async fn update(&self, id: i64, record: &T) -> Result<T, ApiError> {
        self.api
            .request_body(Method::PUT, &self.item_path(id), Some(record))
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api
            .request::<(), serde_json::Value>(Method::DELETE, &self.item_path(id), None)
            .await?;
        Ok(())
    }
}
