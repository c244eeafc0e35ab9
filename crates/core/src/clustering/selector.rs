//! Method selection by input size

use serde::{Deserialize, Serialize};

use super::MethodChoice;
use crate::config::AnalysisConfig;

/// How the pipeline turns the selector's choice into clustering runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Run only the method returned by [`select_method`]
    #[default]
    Threshold,
    /// Below the density threshold run both methods and keep the better
    /// acceptable result; at or above it run the partition method only
    Compare,
}

/// Choose a clustering method from the sample count
///
/// Density clustering needs all pairwise neighbourhoods, so it is only used
/// while `sample_count < config.density_threshold`.
#[must_use]
pub fn select_method(sample_count: usize, config: &AnalysisConfig) -> MethodChoice {
    if sample_count < config.density_threshold {
        MethodChoice::Density
    } else {
        MethodChoice::Partition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary() {
        let config = AnalysisConfig::default();
        assert_eq!(select_method(0, &config), MethodChoice::Density);
        assert_eq!(select_method(2999, &config), MethodChoice::Density);
        assert_eq!(select_method(3000, &config), MethodChoice::Partition);
        assert_eq!(select_method(3001, &config), MethodChoice::Partition);
    }

    #[test]
    fn test_custom_threshold() {
        let config = AnalysisConfig {
            density_threshold: 10,
            ..Default::default()
        };
        assert_eq!(select_method(9, &config), MethodChoice::Density);
        assert_eq!(select_method(10, &config), MethodChoice::Partition);
    }
}
