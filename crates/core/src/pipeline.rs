//! End-to-end analysis: validate, embed, cluster, summarise
//!
//! ```text
//! detections ─▶ validate ─▶ truncate ─▶ embed ─▶ select ─▶ cluster ─▶ summarise ─▶ report
//! ```
//!
//! Each stage returns its failure as a value; nothing in the pipeline panics on
//! bad input.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::analysis::{RegionalAnalyzer, RegionalSummary};
use crate::clustering::engine::{validate_vectors, CandidateParams};
use crate::clustering::{
    cluster, select_method, ClusterAssignment, ClusteringResult, MethodChoice, QualityReport,
    SelectionMode,
};
use crate::config::AnalysisConfig;
use crate::core_types::{FeatureVector, FireDetection};
use crate::embedding::EmbeddingProvider;
use crate::error::{AnalysisError, ClusteringError, InputError};
use crate::region::RegionClassifier;

/// Outcome of one clustering attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// The run produced at least two clusters
    Succeeded {
        quality: QualityReport,
        /// Met `min_quality` (and `max_noise_ratio` for density)
        acceptable: bool,
    },
    /// The run failed; the error message is kept
    Failed { reason: String },
}

/// One method tried during selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodAttempt {
    pub method: MethodChoice,
    pub outcome: AttemptOutcome,
    /// Wall-clock time of the attempt (ms)
    pub elapsed_ms: f64,
}

/// Result of [`analyze`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    /// Embedding provider name
    pub embedding: String,
    pub method: MethodChoice,
    pub quality: QualityReport,
    pub params: CandidateParams,
    /// Why `method` was chosen
    pub selection_reason: String,
    /// Every attempted method, in execution order
    pub attempts: Vec<MethodAttempt>,
    pub assignment: ClusterAssignment,
    pub summary: RegionalSummary,
    /// Detections clustered after truncation
    pub processed_samples: usize,
    /// Detections dropped by `max_samples`
    pub truncated: usize,
}

impl AnalysisReport {
    /// Write the report as pretty-printed JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), AnalysisError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("Analysis report saved to {}", path.display());
        Ok(())
    }

    /// Read a report written by [`AnalysisReport::save_json`]
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Run the full analysis on a batch of detections
///
/// # Arguments
/// * `detections` - Deduplicated detections; only the first
///   `config.max_samples` are processed
/// * `embedder` - Feature extraction
/// * `config` - Analysis configuration
///
/// # Returns
/// The report, or the first stage error
pub fn analyze(
    detections: &[FireDetection],
    embedder: &dyn EmbeddingProvider,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    let start = Instant::now();
    config.validate()?;
    validate_detections(detections)?;

    let (batch, truncated) = if detections.len() > config.max_samples {
        warn!(
            "Truncating {} detections to max_samples={}",
            detections.len(),
            config.max_samples
        );
        (
            &detections[..config.max_samples],
            detections.len() - config.max_samples,
        )
    } else {
        (detections, 0)
    };
    info!(
        "Analysing {} detections with {} embedding (dimension {})",
        batch.len(),
        embedder.name(),
        embedder.dimension()
    );

    let vectors = embedder.embed_all(batch);
    if vectors.len() != batch.len() {
        return Err(InputError::AssignmentMismatch(format!(
            "embedder returned {} vectors for {} detections",
            vectors.len(),
            batch.len()
        ))
        .into());
    }
    if let Some(index) = vectors.iter().position(|v| v.dimension() != embedder.dimension()) {
        return Err(InputError::DimensionMismatch {
            index,
            expected: embedder.dimension(),
            found: vectors[index].dimension(),
        }
        .into());
    }
    validate_vectors(&vectors)?;

    let (result, selection_reason, attempts) = run_selection(&vectors, config)?;

    let classifier = RegionClassifier::new(config.regions.clone());
    let summary = RegionalAnalyzer::new(config.region_bounds).summarize(
        batch,
        &result.assignment,
        &classifier,
    )?;

    info!(
        "Analysis finished in {:.2}s: {} ({})",
        start.elapsed().as_secs_f64(),
        result.method,
        selection_reason
    );

    Ok(AnalysisReport {
        generated_at: Utc::now(),
        embedding: embedder.name().to_string(),
        method: result.method,
        quality: result.quality,
        params: result.params,
        selection_reason,
        attempts,
        assignment: result.assignment,
        summary,
        processed_samples: batch.len(),
        truncated,
    })
}

/// Reject an empty batch, invalid fields and repeated ids
pub fn validate_detections(detections: &[FireDetection]) -> Result<(), InputError> {
    if detections.is_empty() {
        return Err(InputError::Empty);
    }
    let mut seen: FxHashSet<_> = FxHashSet::default();
    seen.reserve(detections.len());
    for d in detections {
        d.validate()?;
        if !seen.insert(d.id()) {
            return Err(InputError::DuplicateId(d.id()));
        }
    }
    Ok(())
}

type Selection = (ClusteringResult, String, Vec<MethodAttempt>);

fn run_selection(vectors: &[FeatureVector], config: &AnalysisConfig) -> Result<Selection, AnalysisError> {
    let n = vectors.len();
    let chosen = select_method(n, config);
    info!("Selector chose {} for {} samples (threshold {})", chosen, n, config.density_threshold);

    if config.selection == SelectionMode::Threshold || chosen == MethodChoice::Partition {
        let (outcome, attempt) = attempt(vectors, chosen, config);
        let result = outcome?;
        let reason = if chosen == MethodChoice::Density {
            format!("{chosen} selected: {n} samples below threshold {}", config.density_threshold)
        } else {
            format!(
                "{chosen} selected: {n} samples at or above threshold {}",
                config.density_threshold
            )
        };
        return Ok((result, reason, vec![attempt]));
    }

    let (density, density_attempt) = attempt(vectors, MethodChoice::Density, config);
    let (partition, partition_attempt) = attempt(vectors, MethodChoice::Partition, config);
    let attempts = vec![density_attempt, partition_attempt];

    match (density, partition) {
        (Ok(d), Ok(p)) => {
            let (ds, ps) = (d.score(), p.score());
            let d_ok = is_acceptable(&d, config);
            let p_ok = is_acceptable(&p, config);
            let (winner, reason) = match (d_ok, p_ok) {
                (true, true) | (false, false) => {
                    let qualifier = if d_ok { "higher quality" } else { "best of poor options" };
                    if ds > ps {
                        (d, format!("density selected: {qualifier} ({ds} vs {ps})"))
                    } else {
                        (p, format!("partition selected: {qualifier} ({ps} vs {ds})"))
                    }
                }
                (true, false) => (d, format!("density selected: only acceptable method (quality={ds})")),
                (false, true) => (p, format!("partition selected: only acceptable method (quality={ps})")),
            };
            Ok((winner, reason, attempts))
        }
        (Ok(d), Err(_)) => {
            let reason = format!("density selected: only successful method (quality={})", d.score());
            Ok((d, reason, attempts))
        }
        (Err(_), Ok(p)) => {
            let reason = format!("partition selected: only successful method (quality={})", p.score());
            Ok((p, reason, attempts))
        }
        (Err(density_err), Err(partition_err)) => {
            error!("Both clustering methods failed: {density_err}; {partition_err}");
            Err(density_err.into())
        }
    }
}

fn attempt(
    vectors: &[FeatureVector],
    method: MethodChoice,
    config: &AnalysisConfig,
) -> (Result<ClusteringResult, ClusteringError>, MethodAttempt) {
    let start = Instant::now();
    let result = cluster(vectors, method, config);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let outcome = match &result {
        Ok(r) => {
            info!(
                "{}: {} clusters, quality={}",
                method,
                r.assignment.n_clusters(),
                r.score()
            );
            AttemptOutcome::Succeeded {
                quality: r.quality.clone(),
                acceptable: is_acceptable(r, config),
            }
        }
        Err(e) => {
            warn!("{} clustering failed: {}", method, e);
            AttemptOutcome::Failed {
                reason: e.to_string(),
            }
        }
    };

    (
        result,
        MethodAttempt {
            method,
            outcome,
            elapsed_ms,
        },
    )
}

fn is_acceptable(result: &ClusteringResult, config: &AnalysisConfig) -> bool {
    let thresholds = &config.quality_thresholds;
    let quality_ok = *result.score() >= thresholds.min_quality;
    match result.method {
        MethodChoice::Density => quality_ok && result.quality.noise_ratio <= thresholds.max_noise_ratio,
        MethodChoice::Partition => quality_ok,
    }
}
