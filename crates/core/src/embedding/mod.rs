//! Detection embedding
//!
//! The engine only sees [`FeatureVector`]s; how a detection becomes a vector
//! is behind the [`EmbeddingProvider`] trait. Two providers ship with the
//! crate:
//! - [`CoordinateEmbedder`]: scaled latitude/longitude only
//! - [`EngineeredEmbedder`]: weighted location, time, intensity and confidence
//!   features on fixed physical ranges

pub mod coordinate;
pub mod engineered;

use rayon::prelude::*;

use crate::core_types::{FeatureVector, FireDetection};

pub use coordinate::CoordinateEmbedder;
pub use engineered::{EmbeddingConfig, EngineeredEmbedder, FeatureWeights};

/// Maps detections to fixed-dimension feature vectors
///
/// Implementations must be pure: the same detection always yields the same
/// vector, independent of the rest of the batch.
pub trait EmbeddingProvider: Send + Sync {
    /// Length of every vector this provider produces
    fn dimension(&self) -> usize;

    /// Embed one detection
    fn embed(&self, detection: &FireDetection) -> FeatureVector;

    /// Embed a batch, preserving input order
    fn embed_all(&self, detections: &[FireDetection]) -> Vec<FeatureVector> {
        detections.par_iter().map(|d| self.embed(d)).collect()
    }

    /// Short name for logs and reports
    fn name(&self) -> &str;
}
