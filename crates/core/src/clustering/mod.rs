//! Adaptive clustering of feature vectors
//!
//! Two methods are available, chosen per run by [`select_method`]:
//! - **Density** (DBSCAN): finds arbitrarily shaped clusters and labels sparse
//!   points as noise. Used for small inputs.
//! - **Partition** (k-means++ / Lloyd): searches a range of cluster counts and
//!   keeps the best-scoring one. Used for large inputs.
//!
//! Candidates (scales for density, k values for partition) are evaluated in
//! parallel and reduced deterministically, so a fixed seed always reproduces
//! the same assignment.

pub mod assignment;
pub mod dbscan;
pub mod engine;
pub mod kmeans;
pub mod quality;
pub mod selector;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use assignment::ClusterAssignment;
pub use engine::{cluster, ClusteringResult};
pub use quality::{QualityMetric, QualityReport, QualityScore};
pub use selector::{select_method, SelectionMode};

/// Clustering strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodChoice {
    /// Density-based clustering with noise (DBSCAN)
    Density,
    /// Centroid-based partitioning (k-means)
    Partition,
}

impl fmt::Display for MethodChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Density => write!(f, "density"),
            Self::Partition => write!(f, "partition"),
        }
    }
}

/// Cluster membership of one detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClusterLabel {
    /// Member of the cluster with this index
    Cluster(usize),
    /// Not dense enough to belong to any cluster (density method only)
    Noise,
}

impl ClusterLabel {
    /// Whether this detection was left unclustered
    pub fn is_noise(self) -> bool {
        matches!(self, Self::Noise)
    }

    /// Cluster index, or `None` for noise
    pub fn cluster(self) -> Option<usize> {
        match self {
            Self::Cluster(index) => Some(index),
            Self::Noise => None,
        }
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cluster(index) => write!(f, "cluster {index}"),
            Self::Noise => write!(f, "noise"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_accessors() {
        assert!(ClusterLabel::Noise.is_noise());
        assert!(!ClusterLabel::Cluster(0).is_noise());
        assert_eq!(ClusterLabel::Cluster(3).cluster(), Some(3));
        assert_eq!(ClusterLabel::Noise.cluster(), None);
        assert!(ClusterLabel::Cluster(7) < ClusterLabel::Noise);
        assert_eq!(ClusterLabel::Noise.to_string(), "noise");
        assert_eq!(MethodChoice::Partition.to_string(), "partition");
    }
}
