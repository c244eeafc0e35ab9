//! Regional analysis of clustered detections
//!
//! - `regional`: region statistics and per-cluster profiles
//! - `stats`: descriptive statistics shared by both

pub mod regional;
pub mod stats;

pub use regional::{
    ClusterProfile, GeographicProfile, IntensityCategory, IntensityProfile, RegionStats,
    RegionalAnalyzer, RegionalProfile, RegionalSummary, SizeClass, TemporalProfile,
};
pub use stats::Distribution;
