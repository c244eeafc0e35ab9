//! Full pipeline on a synthetic three-hotspot batch
//!
//! 100 detections around three well-separated European hotspots must come out
//! as exactly three density clusters, each attributed to the region of its
//! hotspot.

mod common;

use std::collections::BTreeSet;

use common::{hotspot_detections, window_end, HOTSPOTS};
use firms_cluster_core::{
    analyze, AnalysisConfig, ClusterLabel, EngineeredEmbedder, MethodChoice, SelectionMode,
};

#[test]
fn test_three_hotspots_three_clusters() {
    let detections = hotspot_detections(&HOTSPOTS, 100, 7);
    let config = AnalysisConfig::default();
    let embedder = EngineeredEmbedder::from_analysis_config(&config, window_end());

    let report = analyze(&detections, &embedder, &config).unwrap();

    assert_eq!(report.method, MethodChoice::Density);
    assert_eq!(report.assignment.n_clusters(), 3);
    assert!(
        *report.quality.score > 0.3,
        "quality {} should exceed 0.3",
        report.quality.score
    );
    assert_eq!(report.processed_samples, 100);
    assert_eq!(report.truncated, 0);

    let regions: BTreeSet<&str> = report
        .summary
        .clusters
        .values()
        .map(|p| p.regions.primary_region.as_str())
        .collect();
    let expected: BTreeSet<&str> = ["Nordic", "Mediterranean West", "Eastern Europe (Central)"]
        .into_iter()
        .collect();
    assert_eq!(regions, expected);
}

#[test]
fn test_clusters_follow_hotspots() {
    let detections = hotspot_detections(&HOTSPOTS, 100, 11);
    let config = AnalysisConfig::default();
    let embedder = EngineeredEmbedder::from_analysis_config(&config, window_end());
    let report = analyze(&detections, &embedder, &config).unwrap();

    // Detections generated for the same hotspot share one cluster label.
    for hotspot in 0..HOTSPOTS.len() {
        let labels: BTreeSet<ClusterLabel> = detections
            .iter()
            .enumerate()
            .filter(|(i, _)| i % HOTSPOTS.len() == hotspot)
            .filter_map(|(_, d)| report.assignment.get(d.id()))
            .filter(|l| !l.is_noise())
            .collect();
        assert_eq!(labels.len(), 1, "hotspot {hotspot} split into {labels:?}");
    }
}

#[test]
fn test_summary_accounts_for_every_detection() {
    let detections = hotspot_detections(&HOTSPOTS, 100, 7);
    let config = AnalysisConfig::default();
    let embedder = EngineeredEmbedder::from_analysis_config(&config, window_end());
    let report = analyze(&detections, &embedder, &config).unwrap();
    let summary = &report.summary;

    assert_eq!(summary.total_detections, 100);
    assert_eq!(summary.out_of_bounds, 0);
    let by_region: usize = summary.regions.values().map(|r| r.count).sum();
    assert_eq!(by_region, 100);
    let by_cluster: usize = summary.clusters.values().map(|c| c.count).sum();
    assert_eq!(by_cluster + summary.noise_points, 100);

    for profile in summary.clusters.values() {
        assert!(profile.intensity.brightness.min >= 330.0);
        assert!(profile.intensity.brightness.max < 350.0);
        assert!(profile.temporal.peak_hour >= 11 && profile.temporal.peak_hour < 15);
        assert!(profile.geography.lat_spread < 1.0);
        assert!(profile.temporal.first_detection <= profile.temporal.last_detection);
    }
}

#[test]
fn test_compare_mode_agrees_on_clear_structure() {
    let detections = hotspot_detections(&HOTSPOTS, 100, 7);
    let config = AnalysisConfig {
        selection: SelectionMode::Compare,
        ..Default::default()
    };
    let embedder = EngineeredEmbedder::from_analysis_config(&config, window_end());
    let report = analyze(&detections, &embedder, &config).unwrap();

    assert_eq!(report.attempts.len(), 2);
    assert_eq!(report.assignment.n_clusters(), 3);
    assert!(report.selection_reason.contains("selected"));
}

#[test]
fn test_report_written_to_disk() {
    let detections = hotspot_detections(&HOTSPOTS, 60, 3);
    let config = AnalysisConfig::default();
    let embedder = EngineeredEmbedder::from_analysis_config(&config, window_end());
    let report = analyze(&detections, &embedder, &config).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("europe_report.json");
    report.save_json(&path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["method"], "Density");
    assert_eq!(json["processed_samples"], 60);
    assert!(json["summary"]["regions"]["Nordic"]["count"].as_u64().unwrap() > 0);
}
