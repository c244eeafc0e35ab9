//! Engineered feature embedding
//!
//! Eight components, each mapped from a fixed physical range so a detection's
//! vector never depends on which other detections share the batch:
//!
//! | # | Feature | Mapping | Weight |
//! |---|---|---|---|
//! | 0 | latitude | degrees / `geo_scale_deg` | geo |
//! | 1 | longitude | degrees / `geo_scale_deg` | geo |
//! | 2 | days since window start | days / `days_back` | temporal |
//! | 3 | hour of day (sin) | sin(2π·h/24) | temporal |
//! | 4 | hour of day (cos) | cos(2π·h/24) | temporal |
//! | 5 | brightness | (K − 300) / 100 | intensity |
//! | 6 | FRP | ln(1 + MW) / ln(1001) | intensity |
//! | 7 | confidence | % / 100 | confidence |

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use super::EmbeddingProvider;
use crate::config::AnalysisConfig;
use crate::core_types::{FeatureVector, FireDetection};
use crate::error::ConfigurationError;

/// Reference brightness temperature subtracted before scaling (K)
const BRIGHTNESS_OFFSET_K: f64 = 300.0;
/// Brightness span mapped to one feature unit (K)
const BRIGHTNESS_SPAN_K: f64 = 100.0;
/// FRP mapped to 1.0 on the log scale (MW)
const FRP_CEILING_MW: f64 = 1000.0;

/// Per-group feature weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    pub geo: f64,
    pub temporal: f64,
    pub intensity: f64,
    pub confidence: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            geo: 1.0,
            temporal: 0.25,
            intensity: 0.25,
            confidence: 0.1,
        }
    }
}

/// Embedding parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Degrees of latitude/longitude per feature unit
    pub geo_scale_deg: f64,
    pub weights: FeatureWeights,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            geo_scale_deg: 10.0,
            weights: FeatureWeights::default(),
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.geo_scale_deg.is_finite() || self.geo_scale_deg <= 0.0 {
            return Err(ConfigurationError::InvalidEmbedding(format!(
                "geo_scale_deg must be positive, got {}",
                self.geo_scale_deg
            )));
        }
        let w = &self.weights;
        let weights = [w.geo, w.temporal, w.intensity, w.confidence];
        if weights.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigurationError::InvalidEmbedding(format!(
                "weights must be finite and non-negative, got {w:?}"
            )));
        }
        if weights.iter().all(|v| *v == 0.0) {
            return Err(ConfigurationError::InvalidEmbedding(
                "at least one weight must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Weighted engineered features over a fixed observation window
#[derive(Debug, Clone)]
pub struct EngineeredEmbedder {
    config: EmbeddingConfig,
    window_start: DateTime<Utc>,
    days_back: f64,
}

impl EngineeredEmbedder {
    /// Dimension of every vector
    pub const DIMENSION: usize = 8;

    /// # Arguments
    /// * `config` - Scale and weights
    /// * `window_end` - End of the observation window
    /// * `days_back` - Window length in days (at least 1)
    pub fn new(config: EmbeddingConfig, window_end: DateTime<Utc>, days_back: u32) -> Self {
        let days_back = days_back.max(1);
        Self {
            config,
            window_start: window_end - Duration::days(i64::from(days_back)),
            days_back: f64::from(days_back),
        }
    }

    /// Embedder for an analysis run whose window ends at `window_end`
    pub fn from_analysis_config(config: &AnalysisConfig, window_end: DateTime<Utc>) -> Self {
        Self::new(config.embedding.clone(), window_end, config.days_back)
    }

    /// Embedder whose window ends at the latest detection
    ///
    /// Falls back to the current time for an empty batch.
    pub fn for_detections(config: &AnalysisConfig, detections: &[FireDetection]) -> Self {
        let window_end = detections
            .iter()
            .map(FireDetection::timestamp)
            .max()
            .unwrap_or_else(Utc::now);
        Self::from_analysis_config(config, window_end)
    }

    pub fn window_start(&self) -> DateTime<Utc> {
        self.window_start
    }
}

impl EmbeddingProvider for EngineeredEmbedder {
    fn dimension(&self) -> usize {
        Self::DIMENSION
    }

    fn embed(&self, detection: &FireDetection) -> FeatureVector {
        let w = &self.config.weights;
        let scale = self.config.geo_scale_deg;

        let elapsed = detection.timestamp() - self.window_start;
        let days = elapsed.num_seconds() as f64 / 86_400.0;

        let ts = detection.timestamp();
        let hour = f64::from(ts.hour()) + f64::from(ts.minute()) / 60.0;
        let angle = TAU * hour / 24.0;

        let brightness = (detection.brightness() - BRIGHTNESS_OFFSET_K) / BRIGHTNESS_SPAN_K;
        let frp = detection.frp().max(0.0).ln_1p() / FRP_CEILING_MW.ln_1p();
        let confidence = f64::from(detection.confidence()) / 100.0;

        FeatureVector::new(
            detection.id(),
            vec![
                w.geo * detection.latitude() / scale,
                w.geo * detection.longitude() / scale,
                w.temporal * days / self.days_back,
                w.temporal * angle.sin(),
                w.temporal * angle.cos(),
                w.intensity * brightness,
                w.intensity * frp,
                w.confidence * confidence,
            ],
        )
    }

    fn name(&self) -> &str {
        "engineered"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn window_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 8, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_feature_values() {
        let ts = Utc.with_ymd_and_hms(2025, 8, 4, 6, 0, 0).unwrap();
        let detection = FireDetection::new(3, 45.0, 10.0, ts)
            .with_intensity(350.0, 1000.0)
            .with_confidence(80.0);
        let config = EmbeddingConfig {
            geo_scale_deg: 10.0,
            weights: FeatureWeights {
                geo: 1.0,
                temporal: 1.0,
                intensity: 1.0,
                confidence: 1.0,
            },
        };
        let v = EngineeredEmbedder::new(config, window_end(), 7).embed(&detection);
        let x = v.values();

        assert_eq!(v.dimension(), EngineeredEmbedder::DIMENSION);
        assert_relative_eq!(x[0], 4.5);
        assert_relative_eq!(x[1], 1.0);
        // Window starts 2025-08-01 00:00, detection is 3.25 days in.
        assert_relative_eq!(x[2], 3.25 / 7.0, epsilon = 1e-12);
        // 06:00 is a quarter turn.
        assert_relative_eq!(x[3], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[4], 0.0, epsilon = 1e-12);
        assert_relative_eq!(x[5], 0.5, epsilon = 1e-12);
        assert_relative_eq!(x[6], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[7], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_independent_of_batch() {
        let ts = Utc.with_ymd_and_hms(2025, 8, 6, 13, 30, 0).unwrap();
        let a = FireDetection::new(1, 50.0, 5.0, ts).with_intensity(330.0, 12.0);
        let b = FireDetection::new(2, 38.0, 22.0, ts).with_intensity(400.0, 250.0);
        let embedder =
            EngineeredEmbedder::new(EmbeddingConfig::default(), window_end(), 7);

        let alone = embedder.embed_all(std::slice::from_ref(&a));
        let together = embedder.embed_all(&[a, b]);
        assert_eq!(alone[0], together[0]);
    }

    #[test]
    fn test_window_from_latest_detection() {
        let early = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 8, 3, 0, 0, 0).unwrap();
        let detections = vec![
            FireDetection::new(1, 45.0, 10.0, early),
            FireDetection::new(2, 45.0, 10.0, late),
        ];
        let config = AnalysisConfig {
            days_back: 2,
            ..Default::default()
        };
        let embedder = EngineeredEmbedder::for_detections(&config, &detections);
        assert_eq!(embedder.window_start(), early);
    }

    #[test]
    fn test_config_validation() {
        assert!(EmbeddingConfig::default().validate().is_ok());
        let bad_scale = EmbeddingConfig {
            geo_scale_deg: 0.0,
            ..Default::default()
        };
        assert!(bad_scale.validate().is_err());
        let zero = EmbeddingConfig {
            weights: FeatureWeights {
                geo: 0.0,
                temporal: 0.0,
                intensity: 0.0,
                confidence: 0.0,
            },
            ..Default::default()
        };
        assert!(zero.validate().is_err());
    }
}
