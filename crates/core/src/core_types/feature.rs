//! Feature vectors produced by the embedding stage

use serde::{Deserialize, Serialize};

use super::detection::DetectionId;

/// Fixed-dimension embedding of one detection
///
/// Owned by the embedding stage and read-only for clustering; the `id` ties
/// each vector back to the detection it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    id: DetectionId,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Create a feature vector for detection `id`
    pub fn new(id: DetectionId, values: Vec<f64>) -> Self {
        Self { id, values }
    }

    pub fn id(&self) -> DetectionId {
        self.id
    }

    /// Number of components
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

/// Squared Euclidean distance between two equal-length slices
#[inline]
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "dimension mismatch");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Euclidean distance between two equal-length slices
#[inline]
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    squared_distance(a, b).sqrt()
}
