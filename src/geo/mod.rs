pub mod geocoder;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub use geocoder::{Geocoder, MapboxGeocoder};

/// Maximum distance between caller and event for a valid check-in.
pub const CHECKIN_RADIUS_M: f64 = 1000.0;

/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Pair two optional columns; both must be present.
    pub fn from_pair(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Self { lat, lon }),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(AppError::InvalidArgument(format!(
                "Latitude {} out of range",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(AppError::InvalidArgument(format!(
                "Longitude {} out of range",
                self.lon
            )));
        }
        Ok(())
    }

    /// Great-circle (haversine) distance in metres.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.lon - self.lon).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }
}

/// Accepted iff the distance is at most the radius; only `> radius` rejects.
pub fn within_checkin_radius(distance_m: f64) -> bool {
    distance_m <= CHECKIN_RADIUS_M
}
