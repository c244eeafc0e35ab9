//! Clustering quality metrics
//!
//! All selectable metrics map to `[-1, 1]`, higher is better. Noise points are
//! excluded from every geometric metric; the composite score penalises them
//! separately through the noise ratio.
//!
//! | Metric | Cost | Notes |
//! |---|---|---|
//! | Silhouette | O(m²) | Exact below `silhouette_sample_size`, seeded subsample above |
//! | Simplified silhouette | O(n·k) | Distances to centroids instead of members |
//! | Composite | O(m²) | Weighted blend of silhouette, CH, DB, noise and balance |

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

use super::kmeans::derive_seed;
use super::ClusterLabel;
use crate::core_types::{distance, squared_distance, FeatureVector};

/// Score used to rank clustering candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QualityMetric {
    /// Mean silhouette coefficient over non-noise points
    #[default]
    Silhouette,
    /// Centroid-based silhouette approximation
    SimplifiedSilhouette,
    /// Weighted blend: 0.3 silhouette, 0.2 Calinski-Harabasz, 0.2
    /// Davies-Bouldin, 0.2 noise penalty, 0.1 cluster balance
    Composite,
}

/// Quality score in `[-1, 1]` with a total order
///
/// Construction clamps into range, maps NaN to `-1` and `-0.0` to `0.0`, so
/// equality and ordering agree. Deserialization goes through the same path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct QualityScore(f64);

impl QualityScore {
    pub const MIN: QualityScore = QualityScore(-1.0);
    pub const MAX: QualityScore = QualityScore(1.0);

    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self::MIN
        } else {
            // Adding 0.0 turns -0.0 into +0.0.
            Self(value.clamp(-1.0, 1.0) + 0.0)
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Deref for QualityScore {
    type Target = f64;

    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl From<f64> for QualityScore {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<QualityScore> for f64 {
    fn from(score: QualityScore) -> Self {
        score.0
    }
}

impl PartialEq for QualityScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QualityScore {}

impl PartialOrd for QualityScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QualityScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for QualityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Score plus the diagnostics reported alongside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Metric that produced `score`
    pub metric: QualityMetric,
    /// Selection score
    pub score: QualityScore,
    /// Mean silhouette over the evaluated points
    pub silhouette: f64,
    /// Whether `silhouette` was computed on a subsample
    pub silhouette_sampled: bool,
    /// Davies-Bouldin index (lower is better)
    pub davies_bouldin: f64,
    /// Calinski-Harabasz index (higher is better)
    pub calinski_harabasz: f64,
    /// Non-empty, non-noise clusters
    pub n_clusters: usize,
    pub noise_points: usize,
    /// `noise_points / total points`
    pub noise_ratio: f64,
    /// Members per cluster
    pub cluster_sizes: Vec<usize>,
    /// `max(0, 1 - std/mean)` of cluster sizes
    pub balance: f64,
}

/// Evaluation inputs shared by every metric
pub struct QualityContext {
    pub metric: QualityMetric,
    /// Non-noise points above which silhouette is subsampled
    pub silhouette_sample_size: usize,
    pub seed: u64,
}

/// Non-noise points grouped by cluster, with centroids
struct Partition<'a> {
    points: Vec<&'a [f64]>,
    clusters: Vec<usize>,
    centroids: Vec<Vec<f64>>,
    sizes: Vec<usize>,
}

impl<'a> Partition<'a> {
    /// Group non-noise points; empty cluster indices are dropped and the rest
    /// renumbered densely
    fn new(vectors: &'a [FeatureVector], labels: &[ClusterLabel]) -> Self {
        let max_label = labels.iter().filter_map(|l| l.cluster()).max();
        let mut remap = vec![usize::MAX; max_label.map_or(0, |m| m + 1)];
        let mut points = Vec::new();
        let mut clusters = Vec::new();
        let mut sizes: Vec<usize> = Vec::new();

        for (v, label) in vectors.iter().zip(labels) {
            let Some(raw) = label.cluster() else {
                continue;
            };
            if remap[raw] == usize::MAX {
                remap[raw] = sizes.len();
                sizes.push(0);
            }
            let c = remap[raw];
            sizes[c] += 1;
            points.push(v.values());
            clusters.push(c);
        }

        let dim = vectors.first().map_or(0, FeatureVector::dimension);
        let mut centroids = vec![vec![0.0; dim]; sizes.len()];
        for (p, &c) in points.iter().zip(&clusters) {
            for (s, x) in centroids[c].iter_mut().zip(p.iter()) {
                *s += x;
            }
        }
        for (centroid, &size) in centroids.iter_mut().zip(&sizes) {
            let n = size as f64;
            centroid.iter_mut().for_each(|s| *s /= n);
        }

        Self {
            points,
            clusters,
            centroids,
            sizes,
        }
    }

    fn k(&self) -> usize {
        self.sizes.len()
    }
}

/// Evaluate a labelling
///
/// # Arguments
/// * `vectors` - Feature vectors in label order
/// * `labels` - One label per vector
/// * `ctx` - Metric selection and silhouette sampling parameters
///
/// # Returns
/// A report whose `score` follows `ctx.metric`. With fewer than two
/// non-empty clusters every geometric metric is 0 and the score is 0.
pub fn evaluate(
    vectors: &[FeatureVector],
    labels: &[ClusterLabel],
    ctx: &QualityContext,
) -> QualityReport {
    let partition = Partition::new(vectors, labels);
    let total = labels.len();
    let noise_points = total - partition.points.len();
    let noise_ratio = if total == 0 {
        0.0
    } else {
        noise_points as f64 / total as f64
    };
    let balance = cluster_balance(&partition.sizes);

    let (silhouette, silhouette_sampled) =
        silhouette(&partition, ctx.silhouette_sample_size, ctx.seed);
    let davies_bouldin = davies_bouldin(&partition);
    let calinski_harabasz = calinski_harabasz(&partition);

    let raw = match ctx.metric {
        QualityMetric::Silhouette => silhouette,
        QualityMetric::SimplifiedSilhouette => simplified_silhouette(&partition),
        QualityMetric::Composite => {
            composite_score(silhouette, calinski_harabasz, davies_bouldin, noise_ratio, balance)
        }
    };

    QualityReport {
        metric: ctx.metric,
        score: QualityScore::new(raw),
        silhouette,
        silhouette_sampled,
        davies_bouldin,
        calinski_harabasz,
        n_clusters: partition.k(),
        noise_points,
        noise_ratio,
        cluster_sizes: partition.sizes,
        balance,
    }
}

/// Weighted blend of the individual indices, in `[0, 1]`
pub fn composite_score(
    silhouette: f64,
    calinski_harabasz: f64,
    davies_bouldin: f64,
    noise_ratio: f64,
    balance: f64,
) -> f64 {
    let silhouette_norm = (silhouette + 1.0) / 2.0;
    let calinski_norm = if calinski_harabasz > 0.0 {
        (calinski_harabasz / 1000.0).min(1.0)
    } else {
        0.0
    };
    let davies_norm = if davies_bouldin.is_finite() {
        (1.0 - davies_bouldin / 10.0).max(0.0)
    } else {
        0.0
    };
    let noise_penalty = (1.0 - noise_ratio * 2.0).max(0.0);

    0.3 * silhouette_norm
        + 0.2 * calinski_norm
        + 0.2 * davies_norm
        + 0.2 * noise_penalty
        + 0.1 * balance
}

/// `max(0, 1 - std/mean)` of cluster sizes (population std)
pub fn cluster_balance(sizes: &[usize]) -> f64 {
    match sizes.len() {
        0 => 0.0,
        1 => 0.5,
        n => {
            let n = n as f64;
            let mean = sizes.iter().sum::<usize>() as f64 / n;
            if mean <= 0.0 {
                return 0.0;
            }
            let var = sizes
                .iter()
                .map(|&s| {
                    let d = s as f64 - mean;
                    d * d
                })
                .sum::<f64>()
                / n;
            (1.0 - var.sqrt() / mean).max(0.0)
        }
    }
}

/// Mean silhouette; returns `(score, sampled)`
fn silhouette(partition: &Partition<'_>, sample_size: usize, seed: u64) -> (f64, bool) {
    let m = partition.points.len();
    if partition.k() < 2 || m < 2 {
        return (0.0, false);
    }

    let (indices, sampled) = if m > sample_size {
        let mut rng = StdRng::seed_from_u64(derive_seed(seed, 0x5111, m as u64));
        let mut picked = rand::seq::index::sample(&mut rng, m, sample_size).into_vec();
        picked.sort_unstable();
        (picked, true)
    } else {
        ((0..m).collect::<Vec<_>>(), false)
    };

    let k = partition.k();
    let mut subset_sizes = vec![0usize; k];
    for &i in &indices {
        subset_sizes[partition.clusters[i]] += 1;
    }
    if subset_sizes.iter().filter(|&&s| s > 0).count() < 2 {
        return (0.0, sampled);
    }

    let per_point: Vec<f64> = indices
        .par_iter()
        .map(|&i| {
            let own = partition.clusters[i];
            if subset_sizes[own] <= 1 {
                return 0.0;
            }
            let mut sums = vec![0.0; k];
            for &j in &indices {
                if i != j {
                    sums[partition.clusters[j]] +=
                        distance(partition.points[i], partition.points[j]);
                }
            }
            let a = sums[own] / (subset_sizes[own] - 1) as f64;
            let b = (0..k)
                .filter(|&c| c != own && subset_sizes[c] > 0)
                .map(|c| sums[c] / subset_sizes[c] as f64)
                .fold(f64::INFINITY, f64::min);
            let denom = a.max(b);
            if denom > 0.0 {
                (b - a) / denom
            } else {
                0.0
            }
        })
        .collect();

    (per_point.iter().sum::<f64>() / per_point.len() as f64, sampled)
}

/// Silhouette with member distances replaced by centroid distances
fn simplified_silhouette(partition: &Partition<'_>) -> f64 {
    let m = partition.points.len();
    if partition.k() < 2 || m == 0 {
        return 0.0;
    }

    let per_point: Vec<f64> = partition
        .points
        .par_iter()
        .zip(partition.clusters.par_iter())
        .map(|(p, &own)| {
            let a = distance(p, &partition.centroids[own]);
            let b = partition
                .centroids
                .iter()
                .enumerate()
                .filter(|&(c, _)| c != own)
                .map(|(_, centroid)| distance(p, centroid))
                .fold(f64::INFINITY, f64::min);
            let denom = a.max(b);
            if denom > 0.0 {
                (b - a) / denom
            } else {
                0.0
            }
        })
        .collect();

    per_point.iter().sum::<f64>() / m as f64
}

/// Davies-Bouldin index; coincident centroids contribute no similarity
fn davies_bouldin(partition: &Partition<'_>) -> f64 {
    let k = partition.k();
    if k < 2 {
        return 0.0;
    }

    let mut scatter = vec![0.0; k];
    for (p, &c) in partition.points.iter().zip(&partition.clusters) {
        scatter[c] += distance(p, &partition.centroids[c]);
    }
    for (s, &size) in scatter.iter_mut().zip(&partition.sizes) {
        *s /= size as f64;
    }

    let mut total = 0.0;
    for i in 0..k {
        let mut worst = 0.0_f64;
        for j in 0..k {
            if i == j {
                continue;
            }
            let d = distance(&partition.centroids[i], &partition.centroids[j]);
            if d > 0.0 {
                worst = worst.max((scatter[i] + scatter[j]) / d);
            }
        }
        total += worst;
    }
    total / k as f64
}

/// Calinski-Harabasz index; 1.0 when every cluster has zero dispersion
fn calinski_harabasz(partition: &Partition<'_>) -> f64 {
    let k = partition.k();
    let m = partition.points.len();
    if k < 2 || m == 0 {
        return 0.0;
    }

    let dim = partition.centroids[0].len();
    let mut overall = vec![0.0; dim];
    for p in &partition.points {
        for (o, x) in overall.iter_mut().zip(p.iter()) {
            *o += x;
        }
    }
    overall.iter_mut().for_each(|o| *o /= m as f64);

    let between: f64 = partition
        .centroids
        .iter()
        .zip(&partition.sizes)
        .map(|(c, &size)| size as f64 * squared_distance(c, &overall))
        .sum();
    let within: f64 = partition
        .points
        .iter()
        .zip(&partition.clusters)
        .map(|(p, &c)| squared_distance(p, &partition.centroids[c]))
        .sum();

    if within <= 0.0 || m <= k {
        return 1.0;
    }
    (between / (k - 1) as f64) / (within / (m - k) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::DetectionId;
    use approx::assert_relative_eq;

    fn vectors(points: &[[f64; 2]]) -> Vec<FeatureVector> {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| FeatureVector::new(DetectionId(i as u64), p.to_vec()))
            .collect()
    }

    fn ctx(metric: QualityMetric) -> QualityContext {
        QualityContext {
            metric,
            silhouette_sample_size: 2000,
            seed: 42,
        }
    }

    fn two_clusters() -> (Vec<FeatureVector>, Vec<ClusterLabel>) {
        let data = vectors(&[[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]]);
        let labels = vec![
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(1),
            ClusterLabel::Cluster(1),
        ];
        (data, labels)
    }

    #[test]
    fn test_silhouette_hand_computed() {
        let (data, labels) = two_clusters();
        let report = evaluate(&data, &labels, &ctx(QualityMetric::Silhouette));

        // a = 1, b = (10 + sqrt(101)) / 2 for every point.
        let b = (10.0 + 101.0_f64.sqrt()) / 2.0;
        let expected = (b - 1.0) / b;
        assert_relative_eq!(report.silhouette, expected, epsilon = 1e-12);
        assert_relative_eq!(*report.score, expected, epsilon = 1e-12);
        assert!(!report.silhouette_sampled);
        assert_eq!(report.n_clusters, 2);
        assert_eq!(report.cluster_sizes, vec![2, 2]);
        assert_relative_eq!(report.balance, 1.0);
    }

    #[test]
    fn test_davies_bouldin_and_calinski() {
        let (data, labels) = two_clusters();
        let report = evaluate(&data, &labels, &ctx(QualityMetric::Silhouette));

        // Scatter 0.5 per cluster, centroid distance 10.
        assert_relative_eq!(report.davies_bouldin, 0.1, epsilon = 1e-12);
        // B = 4 * 25 = 100, W = 4 * 0.25 = 1, CH = (100/1) / (1/2) = 200.
        assert_relative_eq!(report.calinski_harabasz, 200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_noise_excluded_and_counted() {
        let data = vectors(&[[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0], [50.0, 50.0]]);
        let labels = vec![
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(1),
            ClusterLabel::Cluster(1),
            ClusterLabel::Noise,
        ];
        let with_noise = evaluate(&data, &labels, &ctx(QualityMetric::Silhouette));
        let (clean, clean_labels) = two_clusters();
        let without = evaluate(&clean, &clean_labels, &ctx(QualityMetric::Silhouette));

        assert_relative_eq!(with_noise.silhouette, without.silhouette, epsilon = 1e-12);
        assert_eq!(with_noise.noise_points, 1);
        assert_relative_eq!(with_noise.noise_ratio, 0.2);
    }

    #[test]
    fn test_composite_formula() {
        let (data, labels) = two_clusters();
        let report = evaluate(&data, &labels, &ctx(QualityMetric::Composite));
        let expected = composite_score(report.silhouette, 200.0, 0.1, 0.0, 1.0);
        assert_relative_eq!(*report.score, expected, epsilon = 1e-9);

        // Perfect blend: s=1, CH>=1000, DB=0, no noise, perfect balance.
        assert_relative_eq!(composite_score(1.0, 5000.0, 0.0, 0.0, 1.0), 1.0, epsilon = 1e-12);
        // Worst blend stays non-negative.
        assert_relative_eq!(composite_score(-1.0, 0.0, 20.0, 0.9, 0.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_simplified_silhouette_in_range() {
        let (data, labels) = two_clusters();
        let report = evaluate(&data, &labels, &ctx(QualityMetric::SimplifiedSilhouette));
        assert!(*report.score > 0.8 && *report.score <= 1.0);
    }

    #[test]
    fn test_single_cluster_scores_zero() {
        let data = vectors(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        let labels = vec![ClusterLabel::Cluster(0); 3];
        let report = evaluate(&data, &labels, &ctx(QualityMetric::Silhouette));
        assert_eq!(report.n_clusters, 1);
        assert_relative_eq!(report.silhouette, 0.0);
        assert_relative_eq!(report.davies_bouldin, 0.0);
    }

    #[test]
    fn test_subsampled_silhouette_is_deterministic() {
        let mut points = Vec::new();
        for i in 0..60 {
            let offset = if i % 2 == 0 { 0.0 } else { 20.0 };
            points.push([offset + f64::from(i % 7) * 0.1, f64::from(i % 5) * 0.1]);
        }
        let data = vectors(&points);
        let labels: Vec<ClusterLabel> = (0..60).map(|i| ClusterLabel::Cluster(i % 2)).collect();
        let small = QualityContext {
            metric: QualityMetric::Silhouette,
            silhouette_sample_size: 20,
            seed: 3,
        };

        let first = evaluate(&data, &labels, &small);
        let second = evaluate(&data, &labels, &small);
        assert!(first.silhouette_sampled);
        assert_eq!(first, second);
        assert!(first.silhouette > 0.9);
    }

    #[test]
    fn test_score_ordering_and_clamping() {
        assert!(QualityScore::new(0.5) > QualityScore::new(0.2));
        assert_eq!(QualityScore::new(3.0), QualityScore::MAX);
        assert_eq!(QualityScore::new(f64::NAN), QualityScore::MIN);
        let best = [0.1, 0.7, 0.3]
            .into_iter()
            .map(QualityScore::new)
            .max()
            .unwrap();
        assert_relative_eq!(best.value(), 0.7);
    }

    #[test]
    fn test_signed_zero_scores_are_equal() {
        let pos = QualityScore::new(0.0);
        let neg = QualityScore::new(-0.0);
        assert_eq!(pos, neg);
        assert_eq!(pos.cmp(&neg), Ordering::Equal);
        assert!(neg >= pos);
    }

    #[test]
    fn test_deserialized_score_is_clamped() {
        let score: QualityScore = serde_json::from_str("2.5").unwrap();
        assert_eq!(score, QualityScore::MAX);
        let score: QualityScore = serde_json::from_str("-0.0").unwrap();
        assert_eq!(score.value().to_bits(), 0.0_f64.to_bits());
        assert_eq!(serde_json::to_string(&QualityScore::new(0.25)).unwrap(), "0.25");
    }
}
