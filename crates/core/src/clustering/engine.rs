//! Candidate search and selection
//!
//! A clustering call expands into a list of candidates (one per density scale
//! or one per k), evaluates them in parallel, and keeps the best score. The
//! reduction walks the collected results in candidate order, so the winner is
//! independent of thread scheduling; exact ties keep the earlier candidate,
//! which for the partition method is the smaller k.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::dbscan::Dbscan;
use super::kmeans::KMeans;
use super::quality::{evaluate, QualityContext, QualityReport, QualityScore};
use super::{ClusterAssignment, ClusterLabel, MethodChoice};
use crate::config::AnalysisConfig;
use crate::core_types::FeatureVector;
use crate::error::{DegenerateClusteringError, InputError, Result};

/// Parameters of the winning candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CandidateParams {
    Density {
        /// Effective neighbourhood radius
        epsilon: f64,
        /// Core-point threshold
        min_points: usize,
    },
    Partition {
        /// Cluster count
        k: usize,
        /// Sum of squared distances to centroids
        inertia: f64,
        /// Lloyd iterations of the kept restart
        iterations: usize,
    },
}

/// Output of [`cluster`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringResult {
    pub method: MethodChoice,
    pub assignment: ClusterAssignment,
    /// Selection score and diagnostics of the winning candidate
    pub quality: QualityReport,
    pub params: CandidateParams,
    /// Candidates evaluated, including degenerate ones
    pub candidates_evaluated: usize,
}

impl ClusteringResult {
    pub fn score(&self) -> QualityScore {
        self.quality.score
    }
}

struct Candidate {
    labels: Vec<ClusterLabel>,
    params: CandidateParams,
    report: QualityReport,
}

/// Cluster feature vectors with the given method
///
/// # Arguments
/// * `vectors` - Embeddings of one detection batch, uniform dimension
/// * `method` - Strategy chosen by the selector
/// * `config` - Validated analysis configuration
///
/// # Returns
/// The best-scoring candidate, or an error when the input is unusable or
/// every candidate produced fewer than two clusters
pub fn cluster(
    vectors: &[FeatureVector],
    method: MethodChoice,
    config: &AnalysisConfig,
) -> Result<ClusteringResult> {
    config.validate()?;
    validate_vectors(vectors)?;

    let ctx = QualityContext {
        metric: config.quality_metric,
        silhouette_sample_size: config.silhouette_sample_size,
        seed: config.seed,
    };

    let candidates = match method {
        MethodChoice::Density => density_candidates(vectors, config, &ctx),
        MethodChoice::Partition => partition_candidates(vectors, config, &ctx)?,
    };
    let evaluated = candidates.len();

    let mut best: Option<Candidate> = None;
    let mut most_clusters: Option<(usize, usize)> = None;
    for candidate in candidates {
        let report = &candidate.report;
        if report.n_clusters < 2 {
            warn!(
                "Degenerate {} candidate {:?}: {} cluster(s), {} noise",
                method, candidate.params, report.n_clusters, report.noise_points
            );
            let summary = (report.n_clusters, report.noise_points);
            most_clusters = match most_clusters {
                Some((c, noise)) if c > summary.0 || (c == summary.0 && noise <= summary.1) => {
                    Some((c, noise))
                }
                _ => Some(summary),
            };
            continue;
        }

        debug!(
            "{} candidate {:?}: {} clusters, score {}",
            method, candidate.params, report.n_clusters, report.score
        );
        best = match best {
            Some(current) if current.report.score >= candidate.report.score => Some(current),
            _ => Some(candidate),
        };
    }

    let Some(best) = best else {
        let (clusters_found, noise_points) = most_clusters.unwrap_or((0, 0));
        return Err(DegenerateClusteringError {
            method,
            clusters_found,
            noise_points,
            samples: vectors.len(),
        }
        .into());
    };

    let assignment = ClusterAssignment::from_vectors(vectors, &best.labels)?;
    info!(
        "Selected {} clustering {:?}: {} clusters, {} noise, score {} ({} candidates)",
        method,
        best.params,
        assignment.n_clusters(),
        assignment.noise_count(),
        best.report.score,
        evaluated
    );

    Ok(ClusteringResult {
        method,
        assignment,
        quality: best.report,
        params: best.params,
        candidates_evaluated: evaluated,
    })
}

/// Reject empty input, mixed dimensions and non-finite components
pub fn validate_vectors(vectors: &[FeatureVector]) -> std::result::Result<(), InputError> {
    let Some(first) = vectors.first() else {
        return Err(InputError::Empty);
    };
    let expected = first.dimension();
    if expected == 0 {
        return Err(InputError::DimensionMismatch {
            index: 0,
            expected: 1,
            found: 0,
        });
    }
    for (index, v) in vectors.iter().enumerate() {
        if v.dimension() != expected {
            return Err(InputError::DimensionMismatch {
                index,
                expected,
                found: v.dimension(),
            });
        }
        if !v.is_finite() {
            return Err(InputError::NonFiniteFeature(v.id()));
        }
    }
    Ok(())
}

fn density_candidates(
    vectors: &[FeatureVector],
    config: &AnalysisConfig,
    ctx: &QualityContext,
) -> Vec<Candidate> {
    let params = &config.density_params;
    params
        .neighborhood_scales
        .par_iter()
        .map(|scale| {
            let dbscan = Dbscan::new(params.neighborhood_size * scale, params.min_cluster_size);
            let labels = dbscan.fit(vectors);
            let report = evaluate(vectors, &labels, ctx);
            Candidate {
                labels,
                params: CandidateParams::Density {
                    epsilon: dbscan.epsilon(),
                    min_points: dbscan.min_points(),
                },
                report,
            }
        })
        .collect()
}

fn partition_candidates(
    vectors: &[FeatureVector],
    config: &AnalysisConfig,
    ctx: &QualityContext,
) -> Result<Vec<Candidate>> {
    let n = vectors.len();
    let (low, high) = config.cluster_count_range;
    let high = high.min(n.saturating_sub(1));
    if low > high {
        return Err(InputError::InsufficientSamples {
            required: low + 1,
            found: n,
        }
        .into());
    }

    Ok((low..=high)
        .into_par_iter()
        .map(|k| {
            let fit = KMeans::new(k, &config.kmeans).fit_best(
                vectors,
                config.seed,
                config.kmeans.restarts,
            );
            let labels: Vec<ClusterLabel> =
                fit.labels.iter().map(|&c| ClusterLabel::Cluster(c)).collect();
            let report = evaluate(vectors, &labels, ctx);
            Candidate {
                labels,
                params: CandidateParams::Partition {
                    k,
                    inertia: fit.inertia,
                    iterations: fit.iterations,
                },
                report,
            }
        })
        .collect())
}
