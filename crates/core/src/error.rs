//! Error types for the clustering engine
//!
//! Three recoverable failure families are distinguished so a caller can report
//! a failed clustering attempt separately from a low-quality success:
//! - [`InputError`]: the detection set or its feature vectors are unusable
//! - [`ConfigurationError`]: the configuration is invalid, caught before any work
//! - [`DegenerateClusteringError`]: a run completed but produced fewer than two clusters

use thiserror::Error;

use crate::clustering::MethodChoice;
use crate::core_types::DetectionId;

/// Problems with the detection set or its embeddings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// No detections (or no feature vectors) were supplied
    #[error("input is empty: at least one detection is required")]
    Empty,

    /// A detection carries an out-of-range or non-finite field
    #[error("detection {id} is invalid: {reason}")]
    InvalidDetection {
        /// Offending detection
        id: DetectionId,
        /// What is wrong with it
        reason: String,
    },

    /// The same detection id occurs more than once
    #[error("duplicate detection id {0}")]
    DuplicateId(DetectionId),

    /// Feature vectors do not share one dimension
    #[error("feature vector {index} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        /// Position of the offending vector
        index: usize,
        /// Dimension of the first vector
        expected: usize,
        /// Dimension of the offending vector
        found: usize,
    },

    /// A feature vector contains NaN or infinity
    #[error("feature vector for detection {0} contains a non-finite value")]
    NonFiniteFeature(DetectionId),

    /// Too few samples for the requested method
    #[error("need at least {required} samples, got {found}")]
    InsufficientSamples {
        /// Minimum sample count
        required: usize,
        /// Supplied sample count
        found: usize,
    },

    /// A cluster assignment does not cover the detection set exactly
    #[error("cluster assignment does not match detections: {0}")]
    AssignmentMismatch(String),
}

/// Invalid configuration, detected before any computation
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// `cluster_count_range` is empty or starts below 2
    #[error("invalid cluster count range ({low}, {high}): need 2 <= low <= high")]
    InvalidClusterRange {
        /// Lower bound
        low: usize,
        /// Upper bound
        high: usize,
    },

    /// Density parameters are out of range
    #[error("invalid density parameters: {0}")]
    InvalidDensityParams(String),

    /// Method-selection threshold is unusable
    #[error("invalid density threshold {0}: must be at least 1")]
    InvalidThreshold(usize),

    /// k-means iteration parameters are out of range
    #[error("invalid k-means parameters: {0}")]
    InvalidKMeansParams(String),

    /// Quality acceptance thresholds are out of range
    #[error("invalid quality thresholds: {0}")]
    InvalidQualityThresholds(String),

    /// Embedding parameters are out of range
    #[error("invalid embedding parameters: {0}")]
    InvalidEmbedding(String),

    /// A geographic box is inverted, non-finite or out of range
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    /// `max_samples` or `days_back` is zero
    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    /// A region rule is malformed
    #[error("invalid region rule '{name}': {reason}")]
    InvalidRegionRule {
        /// Rule name (may be empty)
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// Two region rules share a priority, leaving overlaps ambiguous
    #[error("region rules '{first}' and '{second}' share priority {priority}")]
    DuplicatePriority {
        /// Shared priority value
        priority: u32,
        /// First rule with that priority
        first: String,
        /// Second rule with that priority
        second: String,
    },

    /// The last-priority rule is not a catch-all
    #[error("the lowest-priority region rule must match anywhere, found '{0}'")]
    MissingFallback(String),

    /// Configuration file could not be read
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A clustering run that produced fewer than two usable clusters
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "{method} clustering is degenerate: {clusters_found} cluster(s), {noise_points} noise point(s) out of {samples} samples"
)]
pub struct DegenerateClusteringError {
    /// Method that was attempted
    pub method: MethodChoice,
    /// Non-noise clusters found by the best attempt
    pub clusters_found: usize,
    /// Points labelled noise by the best attempt
    pub noise_points: usize,
    /// Number of input samples
    pub samples: usize,
}

/// Failure of a single clustering call
#[derive(Debug, Error)]
pub enum ClusteringError {
    /// Unusable input
    #[error(transparent)]
    Input(#[from] InputError),

    /// Invalid configuration
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Run finished with fewer than two clusters
    #[error(transparent)]
    Degenerate(#[from] DegenerateClusteringError),
}

/// Failure of a full analysis run
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Unusable input
    #[error(transparent)]
    Input(#[from] InputError),

    /// Invalid configuration
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Every attempted clustering was degenerate
    #[error(transparent)]
    Degenerate(#[from] DegenerateClusteringError),

    /// Report could not be written
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// Report could not be serialized
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<ClusteringError> for AnalysisError {
    fn from(err: ClusteringError) -> Self {
        match err {
            ClusteringError::Input(e) => Self::Input(e),
            ClusteringError::Configuration(e) => Self::Configuration(e),
            ClusteringError::Degenerate(e) => Self::Degenerate(e),
        }
    }
}

/// Result alias for clustering operations
pub type Result<T> = std::result::Result<T, ClusteringError>;
