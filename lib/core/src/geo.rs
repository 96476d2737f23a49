//! Great-circle distance between property locations
//!
//! Uses the haversine formula on a spherical earth. Coordinates are
//! validated on construction, so a [`Coordinates`] value is always usable.

use crate::error::{Error, Result};
use serde::Serialize;

/// Mean earth radius in statute miles
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// A validated latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    /// Validate and build a coordinate pair
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if valid {
            Ok(Self { lat, lon })
        } else {
            Err(Error::InvalidCoordinates { lat, lon })
        }
    }

    /// Build from optional components; a missing component is invalid
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Result<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Self::new(lat, lon),
            (lat, lon) => Err(Error::InvalidCoordinates {
                lat: lat.unwrap_or(f64::NAN),
                lon: lon.unwrap_or(f64::NAN),
            }),
        }
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Distance to another point in miles
    #[inline]
    pub fn miles_to(&self, other: &Coordinates) -> f64 {
        haversine_miles(self, other)
    }
}

/// Haversine distance in miles. Identical points yield exactly 0.0.
pub fn haversine_miles(a: &Coordinates, b: &Coordinates) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    // abs() keeps the result bit-identical when the arguments are swapped
    let dlat = (b.lat - a.lat).abs().to_radians();
    let dlon = (b.lon - a.lon).abs().to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Validate both points and return the distance between them in miles
pub fn distance_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<f64> {
    let a = Coordinates::new(lat1, lon1)?;
    let b = Coordinates::new(lat2, lon2)?;
    Ok(haversine_miles(&a, &b))
}
