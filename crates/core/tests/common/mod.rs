//! Shared fixtures for integration tests
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use firms_cluster_core::FireDetection;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// End of the synthetic observation window
pub fn window_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 8, 0, 0, 0).unwrap()
}

/// Nordic, Mediterranean West and Eastern Europe (Central) hotspots
pub const HOTSPOTS: [(f64, f64); 3] = [(60.0, 20.0), (45.0, 10.0), (48.0, 35.0)];

/// Normal sample clamped to ±3σ
fn jitter(rng: &mut StdRng, sigma: f64) -> f64 {
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    (z * sigma).clamp(-3.0 * sigma, 3.0 * sigma)
}

/// `total` detections spread round-robin over `centers`
///
/// Positions jitter by σ = 0.5°; detections fall in the last two days of a
/// seven-day window, in the early-afternoon overpass, with narrow intensity
/// ranges.
pub fn hotspot_detections(centers: &[(f64, f64)], total: usize, seed: u64) -> Vec<FireDetection> {
    let mut rng = StdRng::seed_from_u64(seed);
    let window_start = window_end() - Duration::days(7);

    (0..total)
        .map(|i| {
            let (lat, lon) = centers[i % centers.len()];
            let date = (window_start + Duration::days(5 + rng.random_range(0..2))).date_naive();
            let ts = date
                .and_hms_opt(rng.random_range(11..15), rng.random_range(0..60), 0)
                .unwrap()
                .and_utc();

            FireDetection::new(
                i as u64,
                lat + jitter(&mut rng, 0.5),
                lon + jitter(&mut rng, 0.5),
                ts,
            )
            .with_intensity(rng.random_range(330.0..350.0), rng.random_range(5.0..30.0))
            .with_confidence(rng.random_range(80.0..100.0))
        })
        .collect()
}

/// `count` detections at one location and time
pub fn identical_detections(count: usize) -> Vec<FireDetection> {
    (0..count)
        .map(|i| {
            FireDetection::new(i as u64, 45.0, 10.0, window_end() - Duration::hours(12))
                .with_intensity(340.0, 10.0)
                .with_confidence(90.0)
        })
        .collect()
}
