use serde::{Deserialize, Serialize};

/// Point in WGS84 geographic coordinates, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct LatLng {
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
}

impl LatLng {
    /// Creates a new point from longitude and latitude (in degrees).
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Returns `true` if both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }

    /// Position in GeoJSON axis order: `[longitude, latitude]`.
    pub fn to_position(&self) -> Vec<f64> {
        vec![self.longitude, self.latitude]
    }
}

/// Geographic bounding box of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LatLngBounds {
    /// North-west (top-left) corner.
    pub north_west: LatLng,
    /// South-east (bottom-right) corner.
    pub south_east: LatLng,
}

impl LatLngBounds {
    /// Western boundary longitude.
    pub fn west(&self) -> f64 {
        self.north_west.longitude
    }

    /// Eastern boundary longitude.
    pub fn east(&self) -> f64 {
        self.south_east.longitude
    }

    /// Northern boundary latitude.
    pub fn north(&self) -> f64 {
        self.north_west.latitude
    }

    /// Southern boundary latitude.
    pub fn south(&self) -> f64 {
        self.south_east.latitude
    }
}
