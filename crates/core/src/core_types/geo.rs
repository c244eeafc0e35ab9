//! Geographic primitives
//!
//! Latitude/longitude points and inclusive bounding boxes in decimal degrees
//! (WGS84, as delivered by the FIRMS feeds).

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (positive north)
    pub latitude: f64,
    /// Longitude in degrees (positive east)
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Inclusive latitude/longitude box
///
/// Boxes never wrap the antimeridian; `lon_min <= lon_max` always holds for a
/// validated box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBox {
    /// Southern edge (degrees)
    pub lat_min: f64,
    /// Northern edge (degrees)
    pub lat_max: f64,
    /// Western edge (degrees)
    pub lon_min: f64,
    /// Eastern edge (degrees)
    pub lon_max: f64,
}

impl GeoBox {
    /// Europe as covered by the FIRMS area query: 34°N–72°N, 25°W–50°E
    pub const EUROPE: GeoBox = GeoBox::new(34.0, 72.0, -25.0, 50.0);

    /// The whole globe
    pub const WORLD: GeoBox = GeoBox::new(-90.0, 90.0, -180.0, 180.0);

    /// Create a box from its edges. Use [`GeoBox::validate`] before relying on it.
    pub const fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Inclusive containment test. Non-finite coordinates are never contained.
    #[inline]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.lat_min
            && latitude <= self.lat_max
            && longitude >= self.lon_min
            && longitude <= self.lon_max
    }

    /// Inclusive containment test for a [`GeoPoint`]
    #[inline]
    pub fn contains_point(&self, point: GeoPoint) -> bool {
        self.contains(point.latitude, point.longitude)
    }

    /// Check that edges are finite, ordered and inside WGS84 ranges
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let edges = [self.lat_min, self.lat_max, self.lon_min, self.lon_max];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(ConfigurationError::InvalidBounds(format!(
                "non-finite edge in {self:?}"
            )));
        }
        if self.lat_min > self.lat_max || self.lon_min > self.lon_max {
            return Err(ConfigurationError::InvalidBounds(format!(
                "inverted box: lat {}..{}, lon {}..{}",
                self.lat_min, self.lat_max, self.lon_min, self.lon_max
            )));
        }
        if self.lat_min < -90.0 || self.lat_max > 90.0 {
            return Err(ConfigurationError::InvalidBounds(format!(
                "latitude outside [-90, 90]: {}..{}",
                self.lat_min, self.lat_max
            )));
        }
        if self.lon_min < -180.0 || self.lon_max > 180.0 {
            return Err(ConfigurationError::InvalidBounds(format!(
                "longitude outside [-180, 180]: {}..{}",
                self.lon_min, self.lon_max
            )));
        }
        Ok(())
    }
}

impl Default for GeoBox {
    fn default() -> Self {
        Self::EUROPE
    }
}

/// Running latitude/longitude extent of a set of points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoExtent {
    /// Smallest latitude seen
    pub lat_min: f64,
    /// Largest latitude seen
    pub lat_max: f64,
    /// Smallest longitude seen
    pub lon_min: f64,
    /// Largest longitude seen
    pub lon_max: f64,
}

impl GeoExtent {
    /// Extent of a single point
    pub fn from_point(latitude: f64, longitude: f64) -> Self {
        Self {
            lat_min: latitude,
            lat_max: latitude,
            lon_min: longitude,
            lon_max: longitude,
        }
    }

    /// Grow the extent to include a point
    pub fn include(&mut self, latitude: f64, longitude: f64) {
        self.lat_min = self.lat_min.min(latitude);
        self.lat_max = self.lat_max.max(latitude);
        self.lon_min = self.lon_min.min(longitude);
        self.lon_max = self.lon_max.max(longitude);
    }

    /// Latitude span in degrees
    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Longitude span in degrees
    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }
}
