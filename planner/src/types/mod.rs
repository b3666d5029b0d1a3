//! Type definitions

pub mod analytics;
pub mod depot;
pub mod driver;
pub mod geocoding;
pub mod history;
pub mod order;
pub mod route;
pub mod vehicle;
pub mod vrp;

pub use analytics::*;
pub use depot::*;
pub use driver::*;
pub use geocoding::*;
pub use history::*;
pub use order::*;
pub use route::*;
pub use vehicle::*;
pub use vrp::*;

use serde::{Deserialize, Serialize};

/// Geographic point as stored by the backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}
