//! Density-based clustering (DBSCAN)
//!
//! A point is a *core* point when at least `min_points` vectors (itself
//! included) lie within `epsilon` of it. Clusters are the connected components
//! of core points plus the border points they reach; everything else is
//! noise. Neighbourhoods are precomputed in parallel, then expansion runs
//! sequentially in input order so labels are reproducible.

use rayon::prelude::*;
use tracing::debug;

use super::ClusterLabel;
use crate::core_types::{squared_distance, FeatureVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointState {
    Unvisited,
    Noise,
    Member(usize),
}

/// DBSCAN over Euclidean feature space
#[derive(Debug, Clone, Copy)]
pub struct Dbscan {
    epsilon: f64,
    min_points: usize,
}

impl Dbscan {
    /// # Arguments
    /// * `epsilon` - Neighbourhood radius in feature-space units
    /// * `min_points` - Core-point threshold, counting the point itself
    pub fn new(epsilon: f64, min_points: usize) -> Self {
        Self {
            epsilon,
            min_points: min_points.max(1),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    /// Label every vector with a cluster index or noise
    ///
    /// # Returns
    /// One label per input vector, in input order. Cluster indices are dense
    /// and numbered in order of discovery.
    pub fn fit(&self, vectors: &[FeatureVector]) -> Vec<ClusterLabel> {
        let neighbors = self.neighborhoods(vectors);
        let n = vectors.len();
        let mut states = vec![PointState::Unvisited; n];
        let mut next_cluster = 0usize;

        for i in 0..n {
            if states[i] != PointState::Unvisited {
                continue;
            }
            if neighbors[i].len() < self.min_points {
                states[i] = PointState::Noise;
                continue;
            }

            let cluster = next_cluster;
            next_cluster += 1;
            states[i] = PointState::Member(cluster);

            let mut frontier: Vec<usize> = neighbors[i].clone();
            while let Some(q) = frontier.pop() {
                match states[q] {
                    PointState::Member(_) => continue,
                    // Border point: reached from a core point, never expands.
                    PointState::Noise => {
                        states[q] = PointState::Member(cluster);
                        continue;
                    }
                    PointState::Unvisited => {
                        states[q] = PointState::Member(cluster);
                    }
                }
                if neighbors[q].len() >= self.min_points {
                    frontier.extend(
                        neighbors[q]
                            .iter()
                            .copied()
                            .filter(|&r| !matches!(states[r], PointState::Member(_))),
                    );
                }
            }
        }

        let labels: Vec<ClusterLabel> = states
            .into_iter()
            .map(|state| match state {
                PointState::Member(c) => ClusterLabel::Cluster(c),
                PointState::Noise | PointState::Unvisited => ClusterLabel::Noise,
            })
            .collect();

        debug!(
            "DBSCAN eps={:.4} min_points={}: {} clusters, {} noise of {} points",
            self.epsilon,
            self.min_points,
            next_cluster,
            labels.iter().filter(|l| l.is_noise()).count(),
            n
        );

        labels
    }

    /// Indices within `epsilon` of each vector, including itself, ascending
    fn neighborhoods(&self, vectors: &[FeatureVector]) -> Vec<Vec<usize>> {
        let eps_sq = self.epsilon * self.epsilon;
        vectors
            .par_iter()
            .map(|p| {
                vectors
                    .iter()
                    .enumerate()
                    .filter(|(_, q)| squared_distance(p.values(), q.values()) <= eps_sq)
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect()
    }
}
