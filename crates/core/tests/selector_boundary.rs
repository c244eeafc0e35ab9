//! Method selection at the sample-count threshold

mod common;

use common::{hotspot_detections, window_end, HOTSPOTS};
use firms_cluster_core::{
    analyze, select_method, AnalysisConfig, EngineeredEmbedder, MethodChoice, SelectionMode,
};

#[test]
fn test_default_threshold_boundary() {
    let config = AnalysisConfig::default();
    assert_eq!(config.density_threshold, 3000);
    assert_eq!(select_method(2999, &config), MethodChoice::Density);
    assert_eq!(select_method(3000, &config), MethodChoice::Partition);
    assert_eq!(select_method(3001, &config), MethodChoice::Partition);
    assert_eq!(select_method(0, &config), MethodChoice::Density);
}

#[test]
fn test_analyze_switches_method_at_threshold() {
    let config = AnalysisConfig {
        density_threshold: 50,
        ..Default::default()
    };
    let embedder = EngineeredEmbedder::from_analysis_config(&config, window_end());

    let below = analyze(&hotspot_detections(&HOTSPOTS, 49, 21), &embedder, &config).unwrap();
    assert_eq!(below.method, MethodChoice::Density);
    assert_eq!(below.attempts.len(), 1);
    assert!(below.selection_reason.contains("below threshold 50"));

    let at = analyze(&hotspot_detections(&HOTSPOTS, 50, 21), &embedder, &config).unwrap();
    assert_eq!(at.method, MethodChoice::Partition);
    assert_eq!(at.attempts.len(), 1);
    assert!(at.selection_reason.contains("at or above threshold 50"));
    assert_eq!(at.assignment.noise_count(), 0);
}

#[test]
fn test_compare_mode_skipped_at_threshold() {
    let config = AnalysisConfig {
        density_threshold: 50,
        selection: SelectionMode::Compare,
        ..Default::default()
    };
    let embedder = EngineeredEmbedder::from_analysis_config(&config, window_end());

    let below = analyze(&hotspot_detections(&HOTSPOTS, 49, 4), &embedder, &config).unwrap();
    assert_eq!(below.attempts.len(), 2);
    assert_eq!(below.attempts[0].method, MethodChoice::Density);
    assert_eq!(below.attempts[1].method, MethodChoice::Partition);

    let at = analyze(&hotspot_detections(&HOTSPOTS, 50, 4), &embedder, &config).unwrap();
    assert_eq!(at.attempts.len(), 1);
    assert_eq!(at.method, MethodChoice::Partition);
}

#[test]
fn test_truncation_happens_before_selection() {
    // 60 detections truncated to 40 fall below a threshold of 50.
    let config = AnalysisConfig {
        density_threshold: 50,
        max_samples: 40,
        ..Default::default()
    };
    let embedder = EngineeredEmbedder::from_analysis_config(&config, window_end());
    let report = analyze(&hotspot_detections(&HOTSPOTS, 60, 8), &embedder, &config).unwrap();

    assert_eq!(report.method, MethodChoice::Density);
    assert_eq!(report.processed_samples, 40);
    assert_eq!(report.truncated, 20);
}
