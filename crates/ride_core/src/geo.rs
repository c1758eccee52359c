//! Geographic primitives: coordinate validation and great-circle distance.
//!
//! Every function here is total. Invalid input yields a safe default instead of
//! propagating NaN into the ride state.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const LUANDA_CENTER_LAT: f64 = -8.839988;
pub const LUANDA_CENTER_LNG: f64 = 13.289437;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            address: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Luanda city center; the fallback when no device position is available.
    pub fn luanda_center() -> Self {
        Self::new(LUANDA_CENTER_LAT, LUANDA_CENTER_LNG).with_address("Luanda, Angola")
    }

    /// Both coordinates are finite real numbers.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Valid and inside the latitude/longitude ranges of the globe.
    pub fn is_in_range(&self) -> bool {
        self.is_valid() && (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// A new point shifted by the given degrees. The address is not carried over.
    pub fn offset(&self, dlat: f64, dlng: f64) -> Self {
        Self::new(self.lat + dlat, self.lng + dlng)
    }

    /// Same coordinates, ignoring the address.
    pub fn same_point(&self, other: &Location) -> bool {
        self.lat == other.lat && self.lng == other.lng
    }

    /// Human-readable label: the address when known, otherwise the coordinates.
    pub fn label(&self) -> String {
        match &self.address {
            Some(address) => address.clone(),
            None => format!("{:.5}, {:.5}", self.lat, self.lng),
        }
    }
}

/// `false` for a missing location or one with a non-finite coordinate.
pub fn is_valid_location(location: Option<&Location>) -> bool {
    location.map(Location::is_valid).unwrap_or(false)
}

/// Haversine distance in kilometres. Returns 0 when either point is invalid.
pub fn distance_km(a: &Location, b: &Location) -> f64 {
    if !a.is_valid() || !b.is_valid() {
        return 0.0;
    }
    let (lat1, lon1) = (a.lat.to_radians(), a.lng.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lng.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    let distance = EARTH_RADIUS_KM * c;
    if distance.is_finite() {
        distance
    } else {
        0.0
    }
}
