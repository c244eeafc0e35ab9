//! FIRMS Fire Clustering Core Library
//!
//! Clusters satellite fire detections over Europe and classifies every
//! detection and cluster into overlapping European subregions.
//!
//! ## Pipeline
//!
//! - Detections are validated and embedded into fixed-dimension feature vectors
//! - The selector picks density clustering (DBSCAN) for small batches and
//!   partition clustering (k-means) for large ones
//! - Candidates are evaluated in parallel and the best-scoring one is kept
//! - A priority-ordered rule table assigns each coordinate one region label
//! - The regional analyzer builds region statistics and per-cluster profiles
//!
//! ```no_run
//! use firms_cluster_core::{analyze, AnalysisConfig, EngineeredEmbedder, FireDetection};
//!
//! # fn load() -> Vec<FireDetection> { Vec::new() }
//! let detections = load();
//! let config = AnalysisConfig::default();
//! let embedder = EngineeredEmbedder::for_detections(&config, &detections);
//! let report = analyze(&detections, &embedder, &config)?;
//! println!("{} clusters", report.assignment.n_clusters());
//! # Ok::<(), firms_cluster_core::AnalysisError>(())
//! ```

// Core types and errors
pub mod config;
pub mod core_types;
pub mod error;

// Engine stages
pub mod analysis;
pub mod clustering;
pub mod embedding;
pub mod pipeline;
pub mod region;

// Re-export core types
pub use config::{AnalysisConfig, DensityParams, KMeansParams, QualityThresholds};
pub use core_types::{
    DayNight, DetectionId, FeatureVector, FireDetection, GeoBox, GeoExtent, GeoPoint, SensorTag,
};
pub use error::{
    AnalysisError, ClusteringError, ConfigurationError, DegenerateClusteringError, InputError,
};

// Re-export engine stages
pub use analysis::{ClusterProfile, IntensityCategory, RegionalAnalyzer, RegionalSummary, SizeClass};
pub use clustering::{
    cluster, select_method, ClusterAssignment, ClusterLabel, ClusteringResult, MethodChoice,
    QualityMetric, QualityScore, SelectionMode,
};
pub use embedding::{CoordinateEmbedder, EmbeddingConfig, EmbeddingProvider, EngineeredEmbedder};
pub use pipeline::{analyze, AnalysisReport, AttemptOutcome, MethodAttempt};
pub use region::{RegionClassifier, RegionPredicate, RegionRule, RegionRuleSet};
