//! Partition clustering (k-means++ seeding, Lloyd iterations)
//!
//! Every run draws from its own `StdRng` seeded from `(seed, k, restart)`, so
//! a run's outcome never depends on which thread executed it or in what order
//! candidates finished.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::config::KMeansParams;
use crate::core_types::{squared_distance, FeatureVector};

/// Outcome of one k-means run
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Centroid index per input vector
    pub labels: Vec<usize>,
    /// Final centroids (`k` of them)
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
    /// Lloyd iterations performed
    pub iterations: usize,
    /// Whether centroid movement fell below tolerance before the cap
    pub converged: bool,
}

/// k-means with a fixed cluster count
#[derive(Debug, Clone, Copy)]
pub struct KMeans {
    k: usize,
    max_iterations: usize,
    tolerance: f64,
}

impl KMeans {
    pub fn new(k: usize, params: &KMeansParams) -> Self {
        Self {
            k: k.max(1),
            max_iterations: params.max_iterations.max(1),
            tolerance: params.tolerance,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Run `restarts` seeded initialisations and keep the lowest inertia
    ///
    /// Ties keep the earlier restart.
    pub fn fit_best(&self, vectors: &[FeatureVector], seed: u64, restarts: usize) -> KMeansFit {
        let mut best: Option<KMeansFit> = None;
        for restart in 0..restarts.max(1) {
            let mut rng = StdRng::seed_from_u64(derive_seed(seed, self.k as u64, restart as u64));
            let fit = self.fit(vectors, &mut rng);
            debug!(
                "k-means k={} restart={}: inertia={:.6} after {} iterations (converged: {})",
                self.k, restart, fit.inertia, fit.iterations, fit.converged
            );
            best = match best {
                Some(current) if current.inertia <= fit.inertia => Some(current),
                _ => Some(fit),
            };
        }
        // restarts.max(1) guarantees at least one fit.
        best.unwrap_or_else(|| self.fit(vectors, &mut StdRng::seed_from_u64(seed)))
    }

    /// Single run: k-means++ seeding followed by Lloyd iterations
    pub fn fit(&self, vectors: &[FeatureVector], rng: &mut StdRng) -> KMeansFit {
        let n = vectors.len();
        if n == 0 {
            return KMeansFit {
                labels: Vec::new(),
                centroids: Vec::new(),
                inertia: 0.0,
                iterations: 0,
                converged: true,
            };
        }

        let mut centroids = self.seed_centroids(vectors, rng);
        let mut labels = vec![0usize; n];
        let mut iterations = 0;
        let mut converged = false;
        let tolerance_sq = self.tolerance * self.tolerance;

        while iterations < self.max_iterations {
            iterations += 1;
            labels = assign(vectors, &centroids);
            let updated = self.update_centroids(vectors, &labels, &centroids);

            let max_shift = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_distance(old, new))
                .fold(0.0_f64, f64::max);
            centroids = updated;

            if max_shift <= tolerance_sq {
                converged = true;
                break;
            }
        }

        labels = assign(vectors, &centroids);
        let inertia = vectors
            .iter()
            .zip(&labels)
            .map(|(v, &c)| squared_distance(v.values(), &centroids[c]))
            .sum();

        KMeansFit {
            labels,
            centroids,
            inertia,
            iterations,
            converged,
        }
    }

    /// k-means++: first centroid uniform, then proportional to squared
    /// distance from the nearest chosen centroid
    fn seed_centroids(&self, vectors: &[FeatureVector], rng: &mut StdRng) -> Vec<Vec<f64>> {
        let n = vectors.len();
        let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(self.k);
        centroids.push(vectors[rng.random_range(0..n)].values().to_vec());

        let mut nearest: Vec<f64> = vectors
            .iter()
            .map(|v| squared_distance(v.values(), &centroids[0]))
            .collect();

        while centroids.len() < self.k {
            let total: f64 = nearest.iter().sum();
            let chosen = if total > 0.0 {
                let mut target = rng.random::<f64>() * total;
                let mut pick = n - 1;
                for (i, &d) in nearest.iter().enumerate() {
                    if target < d {
                        pick = i;
                        break;
                    }
                    target -= d;
                }
                pick
            } else {
                // All points coincide with a centroid.
                rng.random_range(0..n)
            };

            let centroid = vectors[chosen].values().to_vec();
            for (d, v) in nearest.iter_mut().zip(vectors) {
                *d = d.min(squared_distance(v.values(), &centroid));
            }
            centroids.push(centroid);
        }

        centroids
    }

    /// Mean of each cluster; an empty cluster is moved to the point farthest
    /// from its current centroid
    fn update_centroids(
        &self,
        vectors: &[FeatureVector],
        labels: &[usize],
        previous: &[Vec<f64>],
    ) -> Vec<Vec<f64>> {
        let dim = vectors[0].dimension();
        let mut sums = vec![vec![0.0; dim]; self.k];
        let mut counts = vec![0usize; self.k];

        for (v, &c) in vectors.iter().zip(labels) {
            counts[c] += 1;
            for (s, x) in sums[c].iter_mut().zip(v.values()) {
                *s += x;
            }
        }

        let mut taken: Vec<usize> = Vec::new();
        let mut centroids = Vec::with_capacity(self.k);
        for (c, (sum, count)) in sums.into_iter().zip(&counts).enumerate() {
            if *count > 0 {
                let n = *count as f64;
                centroids.push(sum.into_iter().map(|s| s / n).collect());
                continue;
            }

            let farthest = vectors
                .iter()
                .zip(labels)
                .enumerate()
                .filter(|(i, _)| !taken.contains(i))
                .map(|(i, (v, &l))| (i, squared_distance(v.values(), &previous[l])))
                .filter(|&(_, d)| d > 0.0)
                .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                    Some((_, bd)) if bd >= d => best,
                    _ => Some((i, d)),
                });

            match farthest {
                Some((i, _)) => {
                    taken.push(i);
                    centroids.push(vectors[i].values().to_vec());
                }
                None => centroids.push(previous[c].clone()),
            }
        }
        centroids
    }
}

/// Index of the nearest centroid for every vector; ties go to the lower index
fn assign(vectors: &[FeatureVector], centroids: &[Vec<f64>]) -> Vec<usize> {
    vectors
        .par_iter()
        .map(|v| {
            let mut best = 0;
            let mut best_d = f64::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let d = squared_distance(v.values(), centroid);
                if d < best_d {
                    best = c;
                    best_d = d;
                }
            }
            best
        })
        .collect()
}

/// Mix a base seed with two stream indices (splitmix64 finaliser)
pub(crate) fn derive_seed(seed: u64, a: u64, b: u64) -> u64 {
    fn mix(mut z: u64) -> u64 {
        z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
    mix(seed ^ mix(a ^ mix(b)))
}
