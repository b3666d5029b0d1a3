//! Vehicle records served by `/vehicles`

use serde::{Deserialize, Serialize};

use super::order::leading_integer;

/// A delivery vehicle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub plate_number: String,
    #[serde(rename = "type", default)]
    pub vehicle_type: String,
    /// Capacity label, e.g. "1000kg"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Vehicle {
    /// Numeric capacity parsed from the leading digits of `capacity`
    pub fn capacity_units(&self) -> Option<i64> {
        self.capacity.as_deref().and_then(leading_integer)
    }
}
