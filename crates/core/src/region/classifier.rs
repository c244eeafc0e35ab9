//! Priority-ordered region classification

use tracing::debug;

use super::rules::{RegionRule, RegionRuleSet};
use crate::core_types::GeoPoint;

/// Maps a coordinate to exactly one region label
///
/// Total and pure: every input, including NaN and coordinates far outside
/// Europe, resolves to a label. Rules are tried in ascending priority and the
/// first match wins.
#[derive(Debug, Clone, Default)]
pub struct RegionClassifier {
    rules: RegionRuleSet,
}

impl RegionClassifier {
    /// Classifier over a validated rule set
    pub fn new(rules: RegionRuleSet) -> Self {
        debug!("Region classifier initialised with {} rules", rules.len());
        Self { rules }
    }

    /// Classifier over the default European table
    pub fn europe() -> Self {
        Self::new(RegionRuleSet::europe())
    }

    /// Region label for a coordinate
    ///
    /// # Arguments
    /// * `latitude` - Degrees, positive north
    /// * `longitude` - Degrees, positive east
    ///
    /// # Returns
    /// The name of the first matching rule, or the fallback label
    pub fn classify(&self, latitude: f64, longitude: f64) -> &str {
        self.matching_rule(latitude, longitude)
            .map_or_else(|| self.rules.fallback(), |r| r.name.as_str())
    }

    /// Region label for a [`GeoPoint`]
    pub fn classify_point(&self, point: GeoPoint) -> &str {
        self.classify(point.latitude, point.longitude)
    }

    /// The rule that decides a coordinate
    pub fn matching_rule(&self, latitude: f64, longitude: f64) -> Option<&RegionRule> {
        self.rules
            .rules()
            .iter()
            .find(|rule| rule.predicate.matches(latitude, longitude))
    }

    /// Every region name this classifier can return, in evaluation order
    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.rules.region_names()
    }

    /// Label returned for unmatched or non-finite coordinates
    pub fn fallback(&self) -> &str {
        self.rules.fallback()
    }

    /// Rule set in evaluation order
    pub fn rules(&self) -> &RegionRuleSet {
        &self.rules
    }
}
