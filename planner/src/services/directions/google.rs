//! Google Directions API client
//!
//! API documentation:
//! https://developers.google.com/maps/documentation/directions/get-directions

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{DirectionsProvider, LegMeasurement};

/// Origin + destination + 25 intermediate waypoints
const MAX_LOCATIONS_PER_REQUEST: usize = 27;

/// Google Directions client configuration
#[derive(Debug, Clone)]
pub struct GoogleDirectionsConfig {
    /// Base URL of the Maps API (e.g. "https://maps.googleapis.com/maps/api")
    pub base_url: String,
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl GoogleDirectionsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api".to_string(),
            api_key: api_key.into(),
            timeout_seconds: 30,
        }
    }
}

/// Google Directions client
pub struct GoogleDirectionsClient {
    client: Client,
    config: GoogleDirectionsConfig,
}

impl GoogleDirectionsClient {
    pub fn new(config: GoogleDirectionsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Build the request URL for a route through `locations` (at least two)
    pub fn build_url(&self, locations: &[String]) -> String {
        let origin = &locations[0];
        let destination = &locations[locations.len() - 1];

        let mut url = format!(
            "{}/directions/json?origin={}&destination={}&mode=driving&key={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(origin),
            urlencoding::encode(destination),
            urlencoding::encode(&self.config.api_key),
        );

        let intermediate = &locations[1..locations.len() - 1];
        if !intermediate.is_empty() {
            url.push_str("&waypoints=");
            url.push_str(&urlencoding::encode(&intermediate.join("|")));
        }
        url
    }

    async fn request_window(&self, locations: &[String]) -> Result<Vec<LegMeasurement>> {
        let url = self.build_url(locations);

        debug!("Requesting directions for {} locations", locations.len());

        let response = self.client
            .get(&url)
            .send()
            .await
            .context("Failed to send directions request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Directions API returned error {}: {}", status, body);
        }

        let directions: DirectionsResponse = response
            .json()
            .await
            .context("Failed to parse directions response")?;

        parse_directions_response(directions, locations.len() - 1)
    }
}

/// Split `locations` into request windows that share their boundary stop,
/// so legs from consecutive windows join up.
pub fn request_windows(locations: &[String], max_locations: usize) -> Vec<&[String]> {
    let mut windows = Vec::new();
    if locations.len() < 2 || max_locations < 2 {
        return windows;
    }
    let mut start = 0;
    while start < locations.len() - 1 {
        let end = (start + max_locations).min(locations.len());
        windows.push(&locations[start..end]);
        start = end - 1;
    }
    windows
}

/// Extract per-leg measurements from the first route of a response
pub fn parse_directions_response(
    response: DirectionsResponse,
    expected_legs: usize,
) -> Result<Vec<LegMeasurement>> {
    if response.status != "OK" {
        anyhow::bail!(
            "Direction request failed: {}{}",
            response.status,
            response
                .error_message
                .map(|m| format!(" ({})", m))
                .unwrap_or_default()
        );
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .context("No route found")?;

    if route.legs.len() != expected_legs {
        anyhow::bail!(
            "Directions returned {} legs, expected {}",
            route.legs.len(),
            expected_legs
        );
    }

    Ok(route
        .legs
        .into_iter()
        .map(|leg| LegMeasurement {
            duration_seconds: leg.duration.map(|d| d.value).unwrap_or(0),
            distance_meters: leg.distance.map(|d| d.value).unwrap_or(0),
        })
        .collect())
}

#[async_trait]
impl DirectionsProvider for GoogleDirectionsClient {
    async fn route_legs(&self, waypoints: &[String]) -> Result<Vec<LegMeasurement>> {
        if waypoints.len() < 2 {
            return Ok(Vec::new());
        }

        let mut legs = Vec::with_capacity(waypoints.len() - 1);
        for window in request_windows(waypoints, MAX_LOCATIONS_PER_REQUEST) {
            legs.extend(self.request_window(window).await?);
        }
        Ok(legs)
    }

    fn name(&self) -> &str {
        "GoogleDirections"
    }
}

// ============================================================================
// Google Directions API types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    pub status: String,
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DirectionsRoute {
    #[serde(default)]
    pub legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
pub struct DirectionsLeg {
    pub distance: Option<TextValue>,
    pub duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
pub struct TextValue {
    pub value: u64,
}
