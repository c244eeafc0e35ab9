//! Analysis configuration
//!
//! One immutable [`AnalysisConfig`] is threaded through every stage. All fields
//! have defaults matching the European FIRMS workflow, so a JSON file only
//! needs the keys it changes:
//!
//! ```json
//! { "density_threshold": 5000, "kmeans": { "restarts": 5 } }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::clustering::{QualityMetric, SelectionMode};
use crate::core_types::GeoBox;
use crate::embedding::EmbeddingConfig;
use crate::error::ConfigurationError;
use crate::region::RegionRuleSet;

/// DBSCAN parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityParams {
    /// Neighbourhood radius (ε) in feature space
    pub neighborhood_size: f64,
    /// Minimum neighbourhood population for a core point, including itself
    pub min_cluster_size: usize,
    /// Multipliers applied to `neighborhood_size`; each is one candidate run
    pub neighborhood_scales: Vec<f64>,
}

impl Default for DensityParams {
    fn default() -> Self {
        Self {
            neighborhood_size: 0.3,
            min_cluster_size: 5,
            neighborhood_scales: vec![1.0],
        }
    }
}

/// k-means iteration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansParams {
    /// Lloyd iteration cap per run
    pub max_iterations: usize,
    /// Stop when no centroid moves further than this (feature-space units)
    pub tolerance: f64,
    /// Seeded initialisations per k; the lowest-inertia run is kept
    pub restarts: usize,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            restarts: 3,
        }
    }
}

/// Acceptance thresholds used when comparing methods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Minimum quality for a result to count as acceptable
    pub min_quality: f64,
    /// Maximum share of noise points for an acceptable density result
    pub max_noise_ratio: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_quality: 0.3,
            max_noise_ratio: 0.8,
        }
    }
}

/// Complete configuration of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Area of interest; detections outside are counted, not dropped
    pub region_bounds: GeoBox,
    /// Cap on processed detections; extra detections are truncated
    pub max_samples: usize,
    /// Length of the observation window in days
    pub days_back: u32,
    /// Inclusive range of k searched by the partition method
    pub cluster_count_range: (usize, usize),
    pub density_params: DensityParams,
    /// Score used to rank candidates
    pub quality_metric: QualityMetric,
    /// Sample count at which the partition method takes over
    pub density_threshold: usize,
    /// Seed for every random choice in the engine
    pub seed: u64,
    pub kmeans: KMeansParams,
    /// Non-noise points above which silhouette is estimated on a subsample
    pub silhouette_sample_size: usize,
    pub selection: SelectionMode,
    pub quality_thresholds: QualityThresholds,
    pub embedding: EmbeddingConfig,
    pub regions: RegionRuleSet,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            region_bounds: GeoBox::EUROPE,
            max_samples: 200_000,
            days_back: 7,
            cluster_count_range: (2, 10),
            density_params: DensityParams::default(),
            quality_metric: QualityMetric::default(),
            density_threshold: 3000,
            seed: 42,
            kmeans: KMeansParams::default(),
            silhouette_sample_size: 2000,
            selection: SelectionMode::default(),
            quality_thresholds: QualityThresholds::default(),
            embedding: EmbeddingConfig::default(),
            regions: RegionRuleSet::europe(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a JSON file and validate it
    ///
    /// Missing keys take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        info!("Loaded analysis configuration from {}", path.display());
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigurationError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Check every parameter before any computation starts
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.region_bounds.validate()?;

        if self.max_samples == 0 {
            return Err(ConfigurationError::InvalidLimit(
                "max_samples must be at least 1".to_string(),
            ));
        }
        if self.days_back == 0 {
            return Err(ConfigurationError::InvalidLimit(
                "days_back must be at least 1".to_string(),
            ));
        }

        let (low, high) = self.cluster_count_range;
        if low < 2 || low > high {
            return Err(ConfigurationError::InvalidClusterRange { low, high });
        }

        let density = &self.density_params;
        if !density.neighborhood_size.is_finite() || density.neighborhood_size <= 0.0 {
            return Err(ConfigurationError::InvalidDensityParams(format!(
                "neighborhood_size must be positive, got {}",
                density.neighborhood_size
            )));
        }
        if density.min_cluster_size < 1 {
            return Err(ConfigurationError::InvalidDensityParams(
                "min_cluster_size must be at least 1".to_string(),
            ));
        }
        if density.neighborhood_scales.is_empty() {
            return Err(ConfigurationError::InvalidDensityParams(
                "neighborhood_scales must not be empty".to_string(),
            ));
        }
        if let Some(bad) = density
            .neighborhood_scales
            .iter()
            .find(|s| !s.is_finite() || **s <= 0.0)
        {
            return Err(ConfigurationError::InvalidDensityParams(format!(
                "neighborhood scale must be positive, got {bad}"
            )));
        }

        if self.density_threshold == 0 {
            return Err(ConfigurationError::InvalidThreshold(self.density_threshold));
        }

        let kmeans = &self.kmeans;
        if kmeans.max_iterations == 0 || kmeans.restarts == 0 {
            return Err(ConfigurationError::InvalidKMeansParams(format!(
                "max_iterations ({}) and restarts ({}) must be at least 1",
                kmeans.max_iterations, kmeans.restarts
            )));
        }
        if !kmeans.tolerance.is_finite() || kmeans.tolerance < 0.0 {
            return Err(ConfigurationError::InvalidKMeansParams(format!(
                "tolerance must be non-negative, got {}",
                kmeans.tolerance
            )));
        }

        if self.silhouette_sample_size < 2 {
            return Err(ConfigurationError::InvalidLimit(
                "silhouette_sample_size must be at least 2".to_string(),
            ));
        }

        let thresholds = &self.quality_thresholds;
        if !(-1.0..=1.0).contains(&thresholds.min_quality) {
            return Err(ConfigurationError::InvalidQualityThresholds(format!(
                "min_quality must lie in [-1, 1], got {}",
                thresholds.min_quality
            )));
        }
        if !(0.0..=1.0).contains(&thresholds.max_noise_ratio) {
            return Err(ConfigurationError::InvalidQualityThresholds(format!(
                "max_noise_ratio must lie in [0, 1], got {}",
                thresholds.max_noise_ratio
            )));
        }

        self.embedding.validate()?;

        Ok(())
    }
}
