//! Detection-to-cluster assignment

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::ClusterLabel;
use crate::core_types::{DetectionId, FeatureVector};
use crate::error::InputError;

/// Ordered `(detection, label)` entries with an id lookup
///
/// Cluster indices are dense: they run from `0` to `n_clusters() - 1` and every
/// index has at least one member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    entries: Vec<(DetectionId, ClusterLabel)>,
    #[serde(skip)]
    index: FxHashMap<DetectionId, usize>,
    n_clusters: usize,
}

impl ClusterAssignment {
    /// Build an assignment from parallel id and label sequences
    ///
    /// Cluster indices are renumbered to be dense, in order of first
    /// appearance.
    pub fn new(
        ids: impl IntoIterator<Item = DetectionId>,
        labels: impl IntoIterator<Item = ClusterLabel>,
    ) -> Result<Self, InputError> {
        let ids: Vec<DetectionId> = ids.into_iter().collect();
        let labels: Vec<ClusterLabel> = labels.into_iter().collect();
        if ids.len() != labels.len() {
            return Err(InputError::AssignmentMismatch(format!(
                "{} ids but {} labels",
                ids.len(),
                labels.len()
            )));
        }

        let mut remap: FxHashMap<usize, usize> = FxHashMap::default();
        let mut index = FxHashMap::default();
        index.reserve(ids.len());
        let mut entries = Vec::with_capacity(ids.len());

        for (position, (id, label)) in ids.into_iter().zip(labels).enumerate() {
            if index.insert(id, position).is_some() {
                return Err(InputError::DuplicateId(id));
            }
            let label = match label {
                ClusterLabel::Cluster(raw) => {
                    let next = remap.len();
                    ClusterLabel::Cluster(*remap.entry(raw).or_insert(next))
                }
                ClusterLabel::Noise => ClusterLabel::Noise,
            };
            entries.push((id, label));
        }

        Ok(Self {
            entries,
            index,
            n_clusters: remap.len(),
        })
    }

    /// Assignment for feature vectors labelled by position
    pub(crate) fn from_vectors(
        vectors: &[FeatureVector],
        labels: &[ClusterLabel],
    ) -> Result<Self, InputError> {
        Self::new(vectors.iter().map(FeatureVector::id), labels.iter().copied())
    }

    /// Label of a detection
    pub fn get(&self, id: DetectionId) -> Option<ClusterLabel> {
        self.index.get(&id).map(|&i| self.entries[i].1)
    }

    /// Entries in input order
    pub fn entries(&self) -> &[(DetectionId, ClusterLabel)] {
        &self.entries
    }

    /// Labels in input order
    pub fn labels(&self) -> impl Iterator<Item = ClusterLabel> + '_ {
        self.entries.iter().map(|&(_, label)| label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-noise clusters
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Number of noise entries
    pub fn noise_count(&self) -> usize {
        self.labels().filter(|l| l.is_noise()).count()
    }

    /// Member count per cluster index
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for label in self.labels() {
            if let ClusterLabel::Cluster(c) = label {
                sizes[c] += 1;
            }
        }
        sizes
    }
}

impl<'de> Deserialize<'de> for ClusterAssignment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            entries: Vec<(DetectionId, ClusterLabel)>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let (ids, labels): (Vec<_>, Vec<_>) = raw.entries.into_iter().unzip();
        ClusterAssignment::new(ids, labels).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u64) -> Vec<DetectionId> {
        (0..n).map(DetectionId).collect()
    }

    #[test]
    fn test_renumbers_clusters_densely() {
        let labels = vec![
            ClusterLabel::Cluster(7),
            ClusterLabel::Noise,
            ClusterLabel::Cluster(3),
            ClusterLabel::Cluster(7),
        ];
        let assignment = ClusterAssignment::new(ids(4), labels).unwrap();

        assert_eq!(assignment.n_clusters(), 2);
        assert_eq!(assignment.get(DetectionId(0)), Some(ClusterLabel::Cluster(0)));
        assert_eq!(assignment.get(DetectionId(2)), Some(ClusterLabel::Cluster(1)));
        assert_eq!(assignment.get(DetectionId(1)), Some(ClusterLabel::Noise));
        assert_eq!(assignment.get(DetectionId(99)), None);
        assert_eq!(assignment.noise_count(), 1);
        assert_eq!(assignment.cluster_sizes(), vec![2, 1]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = ClusterAssignment::new(ids(3), vec![ClusterLabel::Noise]).unwrap_err();
        assert!(matches!(err, InputError::AssignmentMismatch(_)));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = ClusterAssignment::new(
            vec![DetectionId(1), DetectionId(1)],
            vec![ClusterLabel::Cluster(0), ClusterLabel::Cluster(0)],
        )
        .unwrap_err();
        assert_eq!(err, InputError::DuplicateId(DetectionId(1)));
    }

    #[test]
    fn test_json_round_trip_rebuilds_index() {
        let assignment = ClusterAssignment::new(
            ids(3),
            vec![
                ClusterLabel::Cluster(0),
                ClusterLabel::Cluster(1),
                ClusterLabel::Noise,
            ],
        )
        .unwrap();
        let json = serde_json::to_string(&assignment).unwrap();
        let parsed: ClusterAssignment = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, assignment);
        assert_eq!(parsed.get(DetectionId(1)), Some(ClusterLabel::Cluster(1)));
    }
}
