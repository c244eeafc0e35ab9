//! Regional and per-cluster summaries
//!
//! Every detection is classified exactly once. Region statistics cover all
//! detections, noise included; cluster profiles cover cluster members only.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::stats::{mean, median, sample_std, Distribution};
use crate::clustering::{ClusterAssignment, ClusterLabel};
use crate::core_types::{DetectionId, FireDetection, GeoBox, GeoExtent, GeoPoint};
use crate::error::InputError;
use crate::region::RegionClassifier;

/// Added to the extent area so single-point clusters have a finite density
const DENSITY_AREA_EPSILON: f64 = 1e-6;

/// Fire intensity class from mean brightness and confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntensityCategory {
    /// Brightness ≥ 350 K and confidence ≥ 80 %
    VeryHigh,
    /// Brightness ≥ 320 K and confidence ≥ 70 %
    High,
    /// Brightness ≥ 310 K and confidence ≥ 60 %
    Medium,
    LowToModerate,
}

impl IntensityCategory {
    pub fn classify(mean_brightness: f64, mean_confidence: f64) -> Self {
        if mean_brightness >= 350.0 && mean_confidence >= 80.0 {
            Self::VeryHigh
        } else if mean_brightness >= 320.0 && mean_confidence >= 70.0 {
            Self::High
        } else if mean_brightness >= 310.0 && mean_confidence >= 60.0 {
            Self::Medium
        } else {
            Self::LowToModerate
        }
    }
}

/// Cluster size class by member count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    /// At most 50 detections
    Small,
    /// 51 to 200 detections
    Medium,
    /// More than 200 detections
    Large,
}

impl SizeClass {
    pub fn from_count(count: usize) -> Self {
        match count {
            0..=50 => Self::Small,
            51..=200 => Self::Medium,
            _ => Self::Large,
        }
    }
}

/// Statistics of all detections classified into one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub count: usize,
    /// Mean brightness temperature (K)
    pub mean_brightness: f64,
    /// Mean fire radiative power (MW)
    pub mean_frp: f64,
    pub extent: GeoExtent,
    /// Detections per UTC calendar day
    pub day_histogram: BTreeMap<NaiveDate, usize>,
}

/// Brightness, FRP and confidence of a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityProfile {
    /// Brightness temperature (K)
    pub brightness: Distribution,
    pub frp_mean: f64,
    pub frp_median: f64,
    pub frp_std: f64,
    pub confidence_mean: f64,
    pub category: IntensityCategory,
}

/// Location and shape of a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicProfile {
    /// Mean latitude/longitude of members
    pub centroid: GeoPoint,
    pub extent: GeoExtent,
    /// Sample std of member latitudes (degrees)
    pub lat_spread: f64,
    /// Sample std of member longitudes (degrees)
    pub lon_spread: f64,
    /// Members per square degree of extent
    pub density: f64,
}

/// Timing of a cluster's detections (UTC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalProfile {
    pub day_histogram: BTreeMap<NaiveDate, usize>,
    /// Detections per hour of day
    pub hourly: [usize; 24],
    /// Detections per weekday, Monday first
    pub weekdays: [usize; 7],
    /// Most frequent hour (earliest on ties)
    pub peak_hour: u32,
    /// Most frequent weekday (earliest in the week on ties)
    pub peak_weekday: Weekday,
    pub first_detection: DateTime<Utc>,
    pub last_detection: DateTime<Utc>,
}

/// Region membership of a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalProfile {
    /// Region of the geographic centroid
    pub primary_region: String,
    /// Most frequent member region (lexicographically first on ties)
    pub dominant_region: String,
    /// Members per region
    pub distribution: BTreeMap<String, usize>,
    /// Whether members fall in more than one region
    pub cross_regional: bool,
}

/// Everything reported about one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub count: usize,
    pub size_class: SizeClass,
    pub intensity: IntensityProfile,
    pub geography: GeographicProfile,
    pub temporal: TemporalProfile,
    pub regions: RegionalProfile,
}

/// Output of [`RegionalAnalyzer::summarize`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalSummary {
    /// Per-region statistics over all detections
    pub regions: BTreeMap<String, RegionStats>,
    /// Per-cluster profiles, keyed by cluster index
    pub clusters: BTreeMap<usize, ClusterProfile>,
    pub noise_points: usize,
    pub total_detections: usize,
    /// Detections outside the configured area of interest
    pub out_of_bounds: usize,
}

impl RegionalSummary {
    /// Region label for a cluster's centroid
    pub fn primary_region(&self, cluster: usize) -> Option<&str> {
        self.clusters
            .get(&cluster)
            .map(|p| p.regions.primary_region.as_str())
    }
}

/// Builds region statistics and cluster profiles
#[derive(Debug, Clone, Default)]
pub struct RegionalAnalyzer {
    bounds: GeoBox,
}

impl RegionalAnalyzer {
    /// # Arguments
    /// * `bounds` - Area of interest; detections outside are counted in
    ///   `out_of_bounds` but still classified
    pub fn new(bounds: GeoBox) -> Self {
        Self { bounds }
    }

    /// Summarise detections by region and by cluster
    ///
    /// # Arguments
    /// * `detections` - The clustered batch
    /// * `assignment` - Cluster labels covering exactly `detections`
    /// * `classifier` - Region rules
    ///
    /// # Returns
    /// The summary, or `InputError::AssignmentMismatch` when the assignment
    /// does not cover the detections one-to-one
    pub fn summarize(
        &self,
        detections: &[FireDetection],
        assignment: &ClusterAssignment,
        classifier: &RegionClassifier,
    ) -> Result<RegionalSummary, InputError> {
        if assignment.len() != detections.len() {
            return Err(InputError::AssignmentMismatch(format!(
                "{} detections but {} assignment entries",
                detections.len(),
                assignment.len()
            )));
        }

        let mut seen: FxHashSet<DetectionId> = FxHashSet::default();
        let mut labels = Vec::with_capacity(detections.len());
        for d in detections {
            if !seen.insert(d.id()) {
                return Err(InputError::DuplicateId(d.id()));
            }
            let label = assignment.get(d.id()).ok_or_else(|| {
                InputError::AssignmentMismatch(format!("detection {} has no label", d.id()))
            })?;
            labels.push(label);
        }

        let region_of: Vec<&str> = detections
            .iter()
            .map(|d| classifier.classify(d.latitude(), d.longitude()))
            .collect();

        let out_of_bounds = detections
            .iter()
            .filter(|d| !self.bounds.contains_point(d.location()))
            .count();

        let regions = region_stats(detections, &region_of);

        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut noise_points = 0;
        for (i, label) in labels.iter().enumerate() {
            match label {
                ClusterLabel::Cluster(c) => members.entry(*c).or_default().push(i),
                ClusterLabel::Noise => noise_points += 1,
            }
        }

        let clusters: BTreeMap<usize, ClusterProfile> = members
            .into_iter()
            .map(|(c, idx)| (c, cluster_profile(c, &idx, detections, &region_of, classifier)))
            .collect();

        for profile in clusters.values() {
            debug!(
                "Cluster {}: {} detections, primary region {}, {:?}",
                profile.cluster,
                profile.count,
                profile.regions.primary_region,
                profile.intensity.category
            );
        }
        info!(
            "Regional summary: {} detections in {} regions, {} clusters, {} noise, {} out of bounds",
            detections.len(),
            regions.len(),
            clusters.len(),
            noise_points,
            out_of_bounds
        );

        Ok(RegionalSummary {
            regions,
            clusters,
            noise_points,
            total_detections: detections.len(),
            out_of_bounds,
        })
    }
}

fn region_stats(detections: &[FireDetection], region_of: &[&str]) -> BTreeMap<String, RegionStats> {
    let mut grouped: FxHashMap<&str, Vec<&FireDetection>> = FxHashMap::default();
    for (d, region) in detections.iter().zip(region_of) {
        grouped.entry(*region).or_default().push(d);
    }

    grouped
        .into_iter()
        .map(|(region, group)| {
            let brightness: Vec<f64> = group.iter().map(|d| d.brightness()).collect();
            let frp: Vec<f64> = group.iter().map(|d| d.frp()).collect();
            let stats = RegionStats {
                count: group.len(),
                mean_brightness: mean(&brightness),
                mean_frp: mean(&frp),
                extent: extent_of(&group),
                day_histogram: day_histogram(&group),
            };
            (region.to_string(), stats)
        })
        .collect()
}

fn cluster_profile(
    cluster: usize,
    indices: &[usize],
    detections: &[FireDetection],
    region_of: &[&str],
    classifier: &RegionClassifier,
) -> ClusterProfile {
    let group: Vec<&FireDetection> = indices.iter().map(|&i| &detections[i]).collect();
    let count = group.len();

    let brightness: Vec<f64> = group.iter().map(|d| d.brightness()).collect();
    let frp: Vec<f64> = group.iter().map(|d| d.frp()).collect();
    let confidence: Vec<f64> = group.iter().map(|d| f64::from(d.confidence())).collect();
    let brightness_dist = Distribution::from_values(&brightness);
    let confidence_mean = mean(&confidence);
    let intensity = IntensityProfile {
        brightness: brightness_dist,
        frp_mean: mean(&frp),
        frp_median: median(&frp),
        frp_std: sample_std(&frp),
        confidence_mean,
        category: IntensityCategory::classify(brightness_dist.mean, confidence_mean),
    };

    let lats: Vec<f64> = group.iter().map(|d| d.latitude()).collect();
    let lons: Vec<f64> = group.iter().map(|d| d.longitude()).collect();
    let centroid = GeoPoint::new(mean(&lats), mean(&lons));
    let extent = extent_of(&group);
    let geography = GeographicProfile {
        centroid,
        extent,
        lat_spread: sample_std(&lats),
        lon_spread: sample_std(&lons),
        density: count as f64 / (extent.lat_span() * extent.lon_span() + DENSITY_AREA_EPSILON),
    };

    let mut hourly = [0usize; 24];
    let mut weekdays = [0usize; 7];
    for d in &group {
        hourly[d.hour() as usize] += 1;
        weekdays[d.timestamp().weekday().num_days_from_monday() as usize] += 1;
    }
    let peak_hour = argmax_first(&hourly) as u32;
    let peak_weekday = weekday_from_monday(argmax_first(&weekdays));
    let first_detection = group.iter().map(|d| d.timestamp()).min();
    let last_detection = group.iter().map(|d| d.timestamp()).max();
    let temporal = TemporalProfile {
        day_histogram: day_histogram(&group),
        hourly,
        weekdays,
        peak_hour,
        peak_weekday,
        first_detection: first_detection.unwrap_or_default(),
        last_detection: last_detection.unwrap_or_default(),
    };

    let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
    for &i in indices {
        *distribution.entry(region_of[i].to_string()).or_insert(0) += 1;
    }
    // BTreeMap iterates names in order, so the strict comparison keeps the
    // lexicographically first region on ties.
    let dominant_region = distribution
        .iter()
        .fold(None, |best: Option<(&String, usize)>, (name, &n)| match best {
            Some((_, bn)) if bn >= n => best,
            _ => Some((name, n)),
        })
        .map_or_else(|| classifier.fallback().to_string(), |(name, _)| name.clone());
    let regions = RegionalProfile {
        primary_region: classifier.classify_point(centroid).to_string(),
        dominant_region,
        cross_regional: distribution.len() > 1,
        distribution,
    };

    ClusterProfile {
        cluster,
        count,
        size_class: SizeClass::from_count(count),
        intensity,
        geography,
        temporal,
        regions,
    }
}

fn extent_of(group: &[&FireDetection]) -> GeoExtent {
    let mut iter = group.iter();
    let Some(first) = iter.next() else {
        return GeoExtent::from_point(0.0, 0.0);
    };
    let mut extent = GeoExtent::from_point(first.latitude(), first.longitude());
    for d in iter {
        extent.include(d.latitude(), d.longitude());
    }
    extent
}

fn day_histogram(group: &[&FireDetection]) -> BTreeMap<NaiveDate, usize> {
    let mut histogram = BTreeMap::new();
    for d in group {
        *histogram.entry(d.timestamp().date_naive()).or_insert(0) += 1;
    }
    histogram
}

/// Index of the largest count, earliest on ties
fn argmax_first(counts: &[usize]) -> usize {
    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    best
}

fn weekday_from_monday(index: usize) -> Weekday {
    match index {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}
