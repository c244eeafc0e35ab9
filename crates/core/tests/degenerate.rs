//! Batches with no cluster structure

mod common;

use common::{identical_detections, window_end};
use firms_cluster_core::{
    analyze, AnalysisConfig, AnalysisError, EngineeredEmbedder, MethodChoice, SelectionMode,
};

#[test]
fn test_identical_detections_threshold_mode() {
    let detections = identical_detections(30);
    let config = AnalysisConfig::default();
    let embedder = EngineeredEmbedder::from_analysis_config(&config, window_end());

    let err = analyze(&detections, &embedder, &config).unwrap_err();
    let AnalysisError::Degenerate(degenerate) = err else {
        panic!("expected a degenerate clustering error, got {err}");
    };
    assert_eq!(degenerate.method, MethodChoice::Density);
    assert_eq!(degenerate.samples, 30);
    assert!(degenerate.clusters_found < 2);
}

#[test]
fn test_identical_detections_compare_mode() {
    let detections = identical_detections(30);
    let config = AnalysisConfig {
        selection: SelectionMode::Compare,
        ..Default::default()
    };
    let embedder = EngineeredEmbedder::from_analysis_config(&config, window_end());

    // Both methods fail; the density failure is reported.
    let err = analyze(&detections, &embedder, &config).unwrap_err();
    let AnalysisError::Degenerate(degenerate) = err else {
        panic!("expected a degenerate clustering error, got {err}");
    };
    assert_eq!(degenerate.method, MethodChoice::Density);
}

#[test]
fn test_identical_detections_partition_only() {
    let detections = identical_detections(30);
    let config = AnalysisConfig {
        density_threshold: 10,
        ..Default::default()
    };
    let embedder = EngineeredEmbedder::from_analysis_config(&config, window_end());

    let err = analyze(&detections, &embedder, &config).unwrap_err();
    assert!(
        matches!(&err, AnalysisError::Degenerate(d) if d.method == MethodChoice::Partition),
        "unexpected error: {err}"
    );
}

#[test]
fn test_sparse_points_all_noise() {
    // Five points far apart never reach min_cluster_size = 5.
    let detections: Vec<_> = [(40.0, 0.0), (50.0, 10.0), (60.0, 20.0), (45.0, 30.0), (55.0, -10.0)]
        .iter()
        .enumerate()
        .map(|(i, &(lat, lon))| {
            firms_cluster_core::FireDetection::new(i as u64, lat, lon, window_end())
        })
        .collect();
    let config = AnalysisConfig::default();
    let embedder = EngineeredEmbedder::from_analysis_config(&config, window_end());

    let err = analyze(&detections, &embedder, &config).unwrap_err();
    let AnalysisError::Degenerate(degenerate) = err else {
        panic!("expected a degenerate clustering error, got {err}");
    };
    assert_eq!(degenerate.clusters_found, 0);
    assert_eq!(degenerate.noise_points, 5);
}
