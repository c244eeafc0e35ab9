//! Core types: detections, geography and feature vectors

pub mod detection;
pub mod feature;
pub mod geo;

pub use detection::{DayNight, DetectionId, FireDetection, SensorTag};
pub use feature::{distance, squared_distance, FeatureVector};
pub use geo::{GeoBox, GeoExtent, GeoPoint};
