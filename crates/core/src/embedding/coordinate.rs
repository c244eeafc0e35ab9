//! Location-only embedding

use super::EmbeddingProvider;
use crate::core_types::{FeatureVector, FireDetection};

/// `[latitude / scale, longitude / scale]`
#[derive(Debug, Clone, Copy)]
pub struct CoordinateEmbedder {
    scale_deg: f64,
}

impl CoordinateEmbedder {
    /// Degrees per feature unit; non-positive or non-finite scales fall back
    /// to 1
    pub fn new(scale_deg: f64) -> Self {
        let scale_deg = if scale_deg.is_finite() && scale_deg > 0.0 {
            scale_deg
        } else {
            1.0
        };
        Self { scale_deg }
    }
}

impl Default for CoordinateEmbedder {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl EmbeddingProvider for CoordinateEmbedder {
    fn dimension(&self) -> usize {
        2
    }

    fn embed(&self, detection: &FireDetection) -> FeatureVector {
        FeatureVector::new(
            detection.id(),
            vec![
                detection.latitude() / self.scale_deg,
                detection.longitude() / self.scale_deg,
            ],
        )
    }

    fn name(&self) -> &str {
        "coordinate"
    }
}
