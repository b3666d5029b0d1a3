//! Configuration management

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::defaults::DEFAULT_SERVICE_DURATION_MINUTES;
use crate::services::directions::GoogleDirectionsConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Dashboard REST backend
    pub api_url: String,

    /// Google Maps key; without it every leg uses the fallback estimate
    pub google_maps_api_key: Option<String>,

    pub directions_url: String,

    /// Timeout for backend and directions requests
    pub request_timeout_secs: u64,

    pub route_history_path: PathBuf,

    /// Time spent at each interior stop
    pub service_duration_minutes: u32,

    /// Appended to depot addresses for geocoding; empty disables
    pub address_region: Option<String>,

    pub logs_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("API_URL").unwrap_or_else(|| "http://localhost:8000".to_string());

        let google_maps_api_key = lookup("GOOGLE_MAPS_API_KEY").filter(|k| !k.trim().is_empty());

        let directions_url = lookup("DIRECTIONS_URL")
            .unwrap_or_else(|| "https://maps.googleapis.com/maps/api".to_string());

        let request_timeout_secs = match lookup("DIRECTIONS_TIMEOUT_SECS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("DIRECTIONS_TIMEOUT_SECS must be a number, got '{}'", v))?,
            None => 30,
        };

        let route_history_path = lookup("ROUTE_HISTORY_PATH")
            .unwrap_or_else(|| "data/route_history.json".to_string())
            .into();

        let service_duration_minutes = match lookup("SERVICE_DURATION_MINUTES") {
            Some(v) => v
                .parse()
                .with_context(|| format!("SERVICE_DURATION_MINUTES must be a number, got '{}'", v))?,
            None => DEFAULT_SERVICE_DURATION_MINUTES,
        };

        let address_region = match lookup("ADDRESS_REGION") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().to_string()),
            None => Some("India".to_string()),
        };

        let logs_dir = lookup("LOGS_DIR").unwrap_or_else(|| "logs".to_string()).into();

        Ok(Self {
            api_url,
            google_maps_api_key,
            directions_url,
            request_timeout_secs,
            route_history_path,
            service_duration_minutes,
            address_region,
            logs_dir,
        })
    }

    /// Directions client settings, if an API key is configured
    pub fn directions_config(&self) -> Option<GoogleDirectionsConfig> {
        self.google_maps_api_key.as_ref().map(|key| GoogleDirectionsConfig {
            base_url: self.directions_url.clone(),
            api_key: key.clone(),
            timeout_seconds: self.request_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.directions_url, "https://maps.googleapis.com/maps/api");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.route_history_path, PathBuf::from("data/route_history.json"));
        assert_eq!(config.service_duration_minutes, 30);
        assert_eq!(config.address_region.as_deref(), Some("India"));
        assert_eq!(config.logs_dir, PathBuf::from("logs"));
        assert!(config.directions_config().is_none());
    }

    #[test]
    fn test_config_directions_when_key_set() {
        let config = config_with(&[
            ("GOOGLE_MAPS_API_KEY", "abc"),
            ("DIRECTIONS_URL", "http://localhost:9000"),
            ("DIRECTIONS_TIMEOUT_SECS", "5"),
        ])
        .unwrap();

        let directions = config.directions_config().unwrap();
        assert_eq!(directions.api_key, "abc");
        assert_eq!(directions.base_url, "http://localhost:9000");
        assert_eq!(directions.timeout_seconds, 5);
    }

    #[test]
    fn test_config_blank_key_means_no_directions() {
        let config = config_with(&[("GOOGLE_MAPS_API_KEY", "  ")]).unwrap();
        assert!(config.google_maps_api_key.is_none());
    }

    #[test]
    fn test_config_empty_region_disables_suffix() {
        let config = config_with(&[("ADDRESS_REGION", "")]).unwrap();
        assert!(config.address_region.is_none());
    }

    #[test]
    fn test_config_service_duration_override() {
        let config = config_with(&[("SERVICE_DURATION_MINUTES", "45")]).unwrap();
        assert_eq!(config.service_duration_minutes, 45);
    }

    #[test]
    fn test_config_rejects_bad_numbers() {
        assert!(config_with(&[("SERVICE_DURATION_MINUTES", "half an hour")]).is_err());
        assert!(config_with(&[("DIRECTIONS_TIMEOUT_SECS", "-1")]).is_err());
    }
}
