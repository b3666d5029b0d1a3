//! Fixed leg estimates used when the directions provider fails.
//!
//! Values are demo data for a handful of South Indian city pairs; every
//! leg produced here is tagged `EstimateSource::Fallback` so callers can
//! tell it apart from a measured one.

use crate::defaults::{FALLBACK_LEG_KM, FALLBACK_LEG_MINUTES};
use crate::types::Leg;

/// Estimate for legs whose origin and destination contain the given names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackRule {
    pub origin: String,
    pub destination: String,
    pub minutes: u64,
    pub km: u64,
}

impl FallbackRule {
    pub fn new(origin: &str, destination: &str, minutes: u64, km: u64) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            minutes,
            km,
        }
    }

    fn matches(&self, origin: &str, destination: &str) -> bool {
        origin.contains(&self.origin) && destination.contains(&self.destination)
    }
}

#[derive(Debug, Clone)]
pub struct FallbackTable {
    rules: Vec<FallbackRule>,
    default_minutes: u64,
    default_km: u64,
}

impl Default for FallbackTable {
    fn default() -> Self {
        Self {
            rules: vec![
                FallbackRule::new("Bengaluru", "Chennai", 330, 350),
                FallbackRule::new("Chennai", "Erode", 360, 400),
                FallbackRule::new("Erode", "Bengaluru", 390, 420),
                FallbackRule::new("Madurai", "Kochi", 390, 266),
            ],
            default_minutes: FALLBACK_LEG_MINUTES,
            default_km: FALLBACK_LEG_KM,
        }
    }
}

impl FallbackTable {
    pub fn new(rules: Vec<FallbackRule>, default_minutes: u64, default_km: u64) -> Self {
        Self {
            rules,
            default_minutes,
            default_km,
        }
    }

    /// First matching rule by substring containment, else the flat default.
    /// Direction matters: Chennai → Bengaluru is not Bengaluru → Chennai.
    pub fn lookup(&self, origin: &str, destination: &str) -> Leg {
        self.rules
            .iter()
            .find(|rule| rule.matches(origin, destination))
            .map(|rule| Leg::fallback(rule.minutes, rule.km))
            .unwrap_or_else(|| Leg::fallback(self.default_minutes, self.default_km))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EstimateSource;

    #[test]
    fn test_known_pairs() {
        let table = FallbackTable::default();
        let cases = [
            ("Bengaluru, Karnataka, India", "Chennai, Tamil Nadu, India", 330, 350),
            ("Chennai, Tamil Nadu", "Erode, Tamil Nadu", 360, 400),
            ("Erode", "Bengaluru", 390, 420),
            ("Madurai, Tamil Nadu", "Kochi, Kerala", 390, 266),
        ];
        for (origin, destination, minutes, km) in cases {
            let leg = table.lookup(origin, destination);
            assert_eq!(leg.duration_seconds, minutes * 60, "{} -> {}", origin, destination);
            assert_eq!(leg.distance_meters, km * 1000, "{} -> {}", origin, destination);
            assert_eq!(leg.source, EstimateSource::Fallback);
        }
    }

    #[test]
    fn test_unknown_pair_uses_default() {
        let leg = FallbackTable::default().lookup("Salem", "Coimbatore");
        assert_eq!(leg.duration_seconds, 60 * 60);
        assert_eq!(leg.distance_meters, 40_000);
    }

    #[test]
    fn test_reverse_direction_is_not_matched() {
        let leg = FallbackTable::default().lookup("Chennai", "Bengaluru");
        assert_eq!(leg.duration_seconds, 60 * 60);
    }

    #[test]
    fn test_custom_table() {
        let table = FallbackTable::new(vec![FallbackRule::new("A", "B", 5, 1)], 10, 2);
        assert_eq!(table.lookup("xAx", "yBy").duration_seconds, 300);
        assert_eq!(table.lookup("B", "A").distance_meters, 2000);
    }
}
