use chrono::NaiveTime;

pub const DEFAULT_SERVICE_DURATION_MINUTES: u32 = 30;

/// Leg values used when the directions provider gives no answer
pub const FALLBACK_LEG_MINUTES: u64 = 60;
pub const FALLBACK_LEG_KM: u64 = 40;

/// Route colors, cycled per route index
pub const ROUTE_COLORS: [&str; 5] = ["#4CAF50", "#2196F3", "#FFC107", "#9C27B0", "#F44336"];

/// Addresses substituted for orders without one (demo data)
pub const SAMPLE_CITIES: [&str; 5] = [
    "Bengaluru, Karnataka, India",
    "Hyderabad, Telangana, India",
    "Mumbai, Maharashtra, India",
    "Kolkata, West Bengal, India",
    "Delhi, India",
];

pub const DEPOT_TIME_WINDOW: &str = "8:00 - 9:00";

pub fn default_departure() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).expect("valid static default departure")
}
