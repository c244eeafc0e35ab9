//! Satellite fire detections
//!
//! A [`FireDetection`] is one thermal-anomaly observation from a FIRMS feed
//! (VIIRS or MODIS). Records are already deduplicated and filtered by the
//! collector; this module only validates that the fields are usable.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::geo::GeoPoint;
use crate::error::InputError;

/// Stable identifier of a detection within one analysis batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionId(pub u64);

impl fmt::Display for DetectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Instrument/platform that produced the detection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SensorTag {
    /// VIIRS on Suomi NPP (375 m)
    #[default]
    ViirsSnpp,
    /// VIIRS on NOAA-20 (375 m)
    ViirsNoaa20,
    /// VIIRS on NOAA-21 (375 m)
    ViirsNoaa21,
    /// MODIS on Terra/Aqua (1 km)
    Modis,
    /// Any other source, by name
    Other(String),
}

impl SensorTag {
    /// Map a FIRMS source name (e.g. `VIIRS_SNPP_NRT`) to a tag
    pub fn from_source(source: &str) -> Self {
        let upper = source.to_ascii_uppercase();
        if upper.starts_with("VIIRS_SNPP") {
            Self::ViirsSnpp
        } else if upper.starts_with("VIIRS_NOAA20") {
            Self::ViirsNoaa20
        } else if upper.starts_with("VIIRS_NOAA21") {
            Self::ViirsNoaa21
        } else if upper.starts_with("MODIS") {
            Self::Modis
        } else {
            Self::Other(source.to_string())
        }
    }
}

impl fmt::Display for SensorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ViirsSnpp => write!(f, "VIIRS_SNPP"),
            Self::ViirsNoaa20 => write!(f, "VIIRS_NOAA20"),
            Self::ViirsNoaa21 => write!(f, "VIIRS_NOAA21"),
            Self::Modis => write!(f, "MODIS"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Day or night overpass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DayNight {
    /// Daytime overpass
    #[default]
    Day,
    /// Nighttime overpass
    Night,
}

/// A single fire observation
///
/// Fields are private so a detection cannot change after it has been
/// handed to the engine; build one with [`FireDetection::new`] and the
/// `with_*` methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireDetection {
    id: DetectionId,
    latitude: f64,
    longitude: f64,
    timestamp: DateTime<Utc>,
    /// Detection confidence (0-100 %)
    confidence: f32,
    /// Brightness temperature (K), I-4 channel for VIIRS
    brightness: f64,
    /// Fire radiative power (MW)
    frp: f64,
    sensor: SensorTag,
    day_night: DayNight,
}

impl FireDetection {
    /// Default brightness for records without a measured value (K)
    pub const DEFAULT_BRIGHTNESS: f64 = 320.0;

    /// Create a detection with nominal intensity and full confidence
    pub fn new(id: u64, latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: DetectionId(id),
            latitude,
            longitude,
            timestamp,
            confidence: 100.0,
            brightness: Self::DEFAULT_BRIGHTNESS,
            frp: 0.0,
            sensor: SensorTag::default(),
            day_night: DayNight::default(),
        }
    }

    /// Set brightness temperature (K) and fire radiative power (MW)
    pub fn with_intensity(mut self, brightness: f64, frp: f64) -> Self {
        self.brightness = brightness;
        self.frp = frp;
        self
    }

    /// Set detection confidence (0-100 %)
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set the source sensor
    pub fn with_sensor(mut self, sensor: SensorTag) -> Self {
        self.sensor = sensor;
        self
    }

    /// Set the day/night flag
    pub fn with_day_night(mut self, day_night: DayNight) -> Self {
        self.day_night = day_night;
        self
    }

    pub fn id(&self) -> DetectionId {
        self.id
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Position as a [`GeoPoint`]
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Hour of day (UTC, 0-23)
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    pub fn frp(&self) -> f64 {
        self.frp
    }

    pub fn sensor(&self) -> &SensorTag {
        &self.sensor
    }

    pub fn day_night(&self) -> DayNight {
        self.day_night
    }

    /// Check every field against its documented range
    pub fn validate(&self) -> Result<(), InputError> {
        let invalid = |reason: String| InputError::InvalidDetection {
            id: self.id,
            reason,
        };

        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(invalid(format!("latitude {} outside [-90, 90]", self.latitude)));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(invalid(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        if !self.confidence.is_finite() || !(0.0..=100.0).contains(&self.confidence) {
            return Err(invalid(format!(
                "confidence {} outside [0, 100]",
                self.confidence
            )));
        }
        if !self.brightness.is_finite() || self.brightness <= 0.0 {
            return Err(invalid(format!(
                "brightness {} K must be positive",
                self.brightness
            )));
        }
        if !self.frp.is_finite() || self.frp < 0.0 {
            return Err(invalid(format!("FRP {} MW must be non-negative", self.frp)));
        }
        Ok(())
    }
}
