use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ModelError;

/// A longitude/latitude pair extracted from a GeoJSON point.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Parse `{"type": "Point", "coordinates": [lng, lat, ...]}`.
    pub fn from_geo_json(value: &Value) -> Result<Self, ModelError> {
        let invalid = || ModelError::InvalidGeoJson(value.to_string());

        if value.get("type").and_then(Value::as_str) != Some("Point") {
            return Err(invalid());
        }
        let coordinates = value
            .get("coordinates")
            .and_then(Value::as_array)
            .ok_or_else(invalid)?;
        let [lng, lat, ..] = coordinates.as_slice() else {
            return Err(invalid());
        };
        let (Some(lng), Some(lat)) = (lng.as_f64(), lat.as_f64()) else {
            return Err(invalid());
        };
        Ok(Self { lng, lat })
    }

    pub fn to_geo_json(self) -> Value {
        json!({
            "type": "Point",
            "coordinates": [self.lng, self.lat],
        })
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}
