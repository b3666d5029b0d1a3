//! Directions service for per-leg travel time and distance
//!
//! Uses the Google Directions API when an API key is configured; without one
//! every request fails and callers fall back to the estimate table.

mod fallback;
mod google;

pub use fallback::{FallbackRule, FallbackTable};
pub use google::{GoogleDirectionsClient, GoogleDirectionsConfig};

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

/// Travel measurement for one leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegMeasurement {
    pub duration_seconds: u64,
    pub distance_meters: u64,
}

/// Directions provider abstraction (Google, unavailable, test fakes)
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Measure the route through `waypoints` in order. Returns one
    /// measurement per consecutive pair, i.e. `waypoints.len() - 1` legs.
    async fn route_legs(&self, waypoints: &[String]) -> Result<Vec<LegMeasurement>>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Provider used when no directions backend is configured. Every call
/// fails, so every leg takes the fallback estimate.
#[derive(Debug, Default)]
pub struct UnavailableDirections;

#[async_trait]
impl DirectionsProvider for UnavailableDirections {
    async fn route_legs(&self, waypoints: &[String]) -> Result<Vec<LegMeasurement>> {
        if waypoints.len() < 2 {
            return Ok(Vec::new());
        }
        anyhow::bail!("Directions provider not configured")
    }

    fn name(&self) -> &str {
        "Unavailable"
    }
}

/// Create the directions provider from configuration
pub fn create_directions_provider(
    config: Option<GoogleDirectionsConfig>,
) -> Box<dyn DirectionsProvider> {
    match config {
        Some(cfg) => match GoogleDirectionsClient::new(cfg) {
            Ok(client) => {
                info!("Using Google directions at {}", client.base_url());
                Box::new(client)
            }
            Err(e) => {
                warn!("Failed to create directions client: {}. Using fallback estimates.", e);
                Box::new(UnavailableDirections)
            }
        },
        None => {
            info!("No directions API key configured, legs will use fallback estimates");
            Box::new(UnavailableDirections)
        }
    }
}
