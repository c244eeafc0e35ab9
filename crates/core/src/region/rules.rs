//! Region rules and the ordered rule set
//!
//! Regions overlap on purpose (a fire on the Adriatic coast is both
//! "Mediterranean West" and "Balkans" by shape), so each rule carries a
//! priority and the first match in ascending priority order wins. The table is
//! data: it can be serialised, replaced from configuration, and validated.

use serde::{Deserialize, Serialize};

use crate::core_types::GeoBox;
use crate::error::ConfigurationError;

/// Label of the mandatory catch-all rule
pub const UNCLASSIFIED: &str = "Unclassified";

/// Geographic predicate of a region rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RegionPredicate {
    /// Inclusive latitude/longitude box
    BoundingBox(GeoBox),
    /// Inclusive latitude band, any longitude
    LatitudeBand {
        /// Southern edge (degrees)
        min: f64,
        /// Northern edge (degrees)
        max: f64,
    },
    /// Inclusive longitude band, any latitude
    LongitudeBand {
        /// Western edge (degrees)
        min: f64,
        /// Eastern edge (degrees)
        max: f64,
    },
    /// Matches every coordinate, including non-finite ones
    Anywhere,
}

impl RegionPredicate {
    /// Evaluate the predicate
    #[inline]
    pub fn matches(&self, latitude: f64, longitude: f64) -> bool {
        match *self {
            Self::BoundingBox(ref b) => b.contains(latitude, longitude),
            Self::LatitudeBand { min, max } => latitude >= min && latitude <= max,
            Self::LongitudeBand { min, max } => longitude >= min && longitude <= max,
            Self::Anywhere => true,
        }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidRegionRule {
            name: name.to_string(),
            reason,
        };
        match *self {
            Self::BoundingBox(ref b) => b.validate().map_err(|e| invalid(e.to_string())),
            Self::LatitudeBand { min, max } => {
                if !(min.is_finite() && max.is_finite()) || min > max || min < -90.0 || max > 90.0
                {
                    return Err(invalid(format!("bad latitude band {min}..{max}")));
                }
                Ok(())
            }
            Self::LongitudeBand { min, max } => {
                if !(min.is_finite() && max.is_finite())
                    || min > max
                    || min < -180.0
                    || max > 180.0
                {
                    return Err(invalid(format!("bad longitude band {min}..{max}")));
                }
                Ok(())
            }
            Self::Anywhere => Ok(()),
        }
    }
}

/// A named region with its predicate and evaluation priority
///
/// Lower `priority` values are evaluated first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRule {
    /// Region label returned on match
    pub name: String,
    /// Geographic predicate
    pub predicate: RegionPredicate,
    /// Evaluation order (ascending)
    pub priority: u32,
}

impl RegionRule {
    /// Rule matching an inclusive box
    pub fn bounding_box(
        name: &str,
        priority: u32,
        lat: (f64, f64),
        lon: (f64, f64),
    ) -> Self {
        Self {
            name: name.to_string(),
            predicate: RegionPredicate::BoundingBox(GeoBox::new(lat.0, lat.1, lon.0, lon.1)),
            priority,
        }
    }

    /// Catch-all rule
    pub fn anywhere(name: &str, priority: u32) -> Self {
        Self {
            name: name.to_string(),
            predicate: RegionPredicate::Anywhere,
            priority,
        }
    }
}

/// Validated, priority-ordered list of region rules
///
/// Invariants (checked by [`RegionRuleSet::new`]):
/// - every rule has a non-empty name and a well-formed predicate
/// - priorities are unique
/// - the last rule in priority order is [`RegionPredicate::Anywhere`], so
///   classification is total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRuleSet {
    rules: Vec<RegionRule>,
}

impl RegionRuleSet {
    /// Validate and order a list of rules
    pub fn new(mut rules: Vec<RegionRule>) -> Result<Self, ConfigurationError> {
        for rule in &rules {
            if rule.name.trim().is_empty() {
                return Err(ConfigurationError::InvalidRegionRule {
                    name: rule.name.clone(),
                    reason: "name must not be empty".to_string(),
                });
            }
            rule.predicate.validate(&rule.name)?;
        }

        rules.sort_by_key(|r| r.priority);

        for pair in rules.windows(2) {
            if pair[0].priority == pair[1].priority {
                return Err(ConfigurationError::DuplicatePriority {
                    priority: pair[0].priority,
                    first: pair[0].name.clone(),
                    second: pair[1].name.clone(),
                });
            }
        }

        match rules.last() {
            Some(last) if last.predicate == RegionPredicate::Anywhere => {}
            Some(last) => return Err(ConfigurationError::MissingFallback(last.name.clone())),
            None => return Err(ConfigurationError::MissingFallback(String::new())),
        }

        Ok(Self { rules })
    }

    /// Default European subregion table
    ///
    /// Boxes are inclusive, in degrees. Specific subregions come first; the
    /// broad catch-alls (priority >= 200) only see coordinates that no
    /// subregion claimed.
    ///
    /// | Priority | Region | Latitude | Longitude |
    /// |---|---|---|---|
    /// | 10 | British Isles | 50 – 61 | -11 – 2 |
    /// | 20 | Southeast Mediterranean | 34 – 42 | 19 – 30 |
    /// | 30 | Iberian Peninsula | 35.5 – 44 | -10 – 3.5 |
    /// | 40 | Western Europe (Continental) | 48 – 55 | 2 – 8 |
    /// | 50 | Mediterranean West | 40 – 48 | 2 – 18 |
    /// | 60 | Central Europe | 48 – 55 | 15 – 25 |
    /// | 70 | Eastern Europe (Central) | 44 – 52 | 22 – 38 |
    /// | 80 | Central Western Europe | 47 – 55 | 5 – 15 |
    /// | 90 | Eastern Europe (Russia) | 50 – 60 | 35 – 50 |
    /// | 100 | Balkans | 34 – 48 | 18 – 30 |
    /// | 110 | North Atlantic | 60 – 72 | -25 – 4 |
    /// | 120 | Eastern Europe (Black Sea) | 40 – 50 | 20 – 50 |
    /// | 130 | Nordic | 55 – 72 | 4 – 32 |
    /// | 200 | Western Europe | 48 – 60 | -10 – 15 |
    /// | 210 | Southern Europe | 34 – 48 | -25 – 50 |
    /// | 220 | Eastern Europe | 45 – 60 | 15 – 50 |
    /// | 230 | Northern Europe | 60 – 72 | -25 – 50 |
    /// | 240 | Europe (Other) | 34 – 72 | -25 – 50 |
    /// | 1000 | Unclassified | anywhere | |
    pub fn europe() -> Self {
        Self {
            rules: vec![
                RegionRule::bounding_box("British Isles", 10, (50.0, 61.0), (-11.0, 2.0)),
                RegionRule::bounding_box("Southeast Mediterranean", 20, (34.0, 42.0), (19.0, 30.0)),
                RegionRule::bounding_box("Iberian Peninsula", 30, (35.5, 44.0), (-10.0, 3.5)),
                RegionRule::bounding_box("Western Europe (Continental)", 40, (48.0, 55.0), (2.0, 8.0)),
                RegionRule::bounding_box("Mediterranean West", 50, (40.0, 48.0), (2.0, 18.0)),
                RegionRule::bounding_box("Central Europe", 60, (48.0, 55.0), (15.0, 25.0)),
                RegionRule::bounding_box("Eastern Europe (Central)", 70, (44.0, 52.0), (22.0, 38.0)),
                RegionRule::bounding_box("Central Western Europe", 80, (47.0, 55.0), (5.0, 15.0)),
                RegionRule::bounding_box("Eastern Europe (Russia)", 90, (50.0, 60.0), (35.0, 50.0)),
                RegionRule::bounding_box("Balkans", 100, (34.0, 48.0), (18.0, 30.0)),
                RegionRule::bounding_box("North Atlantic", 110, (60.0, 72.0), (-25.0, 4.0)),
                RegionRule::bounding_box("Eastern Europe (Black Sea)", 120, (40.0, 50.0), (20.0, 50.0)),
                RegionRule::bounding_box("Nordic", 130, (55.0, 72.0), (4.0, 32.0)),
                RegionRule::bounding_box("Western Europe", 200, (48.0, 60.0), (-10.0, 15.0)),
                RegionRule::bounding_box("Southern Europe", 210, (34.0, 48.0), (-25.0, 50.0)),
                RegionRule::bounding_box("Eastern Europe", 220, (45.0, 60.0), (15.0, 50.0)),
                RegionRule::bounding_box("Northern Europe", 230, (60.0, 72.0), (-25.0, 50.0)),
                RegionRule::bounding_box("Europe (Other)", 240, (34.0, 72.0), (-25.0, 50.0)),
                RegionRule::anywhere(UNCLASSIFIED, 1000),
            ],
        }
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> &[RegionRule] {
        &self.rules
    }

    /// Number of rules, including the fallback
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Always false for a validated set; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Region names in evaluation order
    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    /// Label of the fallback rule
    pub fn fallback(&self) -> &str {
        // Validated sets always end in an Anywhere rule.
        self.rules.last().map_or(UNCLASSIFIED, |r| r.name.as_str())
    }
}

impl Default for RegionRuleSet {
    fn default() -> Self {
        Self::europe()
    }
}

impl<'de> Deserialize<'de> for RegionRuleSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            rules: Vec<RegionRule>,
        }

        let raw = Raw::deserialize(deserializer)?;
        RegionRuleSet::new(raw.rules).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_europe_table_is_valid() {
        let table = RegionRuleSet::europe();
        let rebuilt = RegionRuleSet::new(table.rules().to_vec()).unwrap();
        assert_eq!(rebuilt, table);
        assert!(table.len() >= 13);
        assert_eq!(table.fallback(), UNCLASSIFIED);
    }

    #[test]
    fn test_rules_sorted_by_priority() {
        let set = RegionRuleSet::new(vec![
            RegionRule::anywhere("Rest", 99),
            RegionRule::bounding_box("B", 20, (0.0, 10.0), (0.0, 10.0)),
            RegionRule::bounding_box("A", 10, (0.0, 5.0), (0.0, 5.0)),
        ])
        .unwrap();
        let names: Vec<&str> = set.region_names().collect();
        assert_eq!(names, vec!["A", "B", "Rest"]);
    }

    #[test]
    fn test_missing_fallback_rejected() {
        let err = RegionRuleSet::new(vec![RegionRule::bounding_box(
            "Only",
            1,
            (0.0, 1.0),
            (0.0, 1.0),
        )])
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingFallback(name) if name == "Only"));

        assert!(matches!(
            RegionRuleSet::new(Vec::new()),
            Err(ConfigurationError::MissingFallback(_))
        ));
    }

    #[test]
    fn test_fallback_must_be_last() {
        let err = RegionRuleSet::new(vec![
            RegionRule::anywhere("Everything", 1),
            RegionRule::bounding_box("Late", 2, (0.0, 1.0), (0.0, 1.0)),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingFallback(_)));
    }

    #[test]
    fn test_duplicate_priority_rejected() {
        let err = RegionRuleSet::new(vec![
            RegionRule::bounding_box("A", 5, (0.0, 1.0), (0.0, 1.0)),
            RegionRule::bounding_box("B", 5, (1.0, 2.0), (0.0, 1.0)),
            RegionRule::anywhere(UNCLASSIFIED, 10),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicatePriority { priority: 5, .. }));
    }

    #[test]
    fn test_invalid_predicates_rejected() {
        let inverted = RegionRule::bounding_box("Inverted", 1, (10.0, 0.0), (0.0, 1.0));
        assert!(RegionRuleSet::new(vec![inverted, RegionRule::anywhere("X", 2)]).is_err());

        let band = RegionRule {
            name: "Band".to_string(),
            predicate: RegionPredicate::LatitudeBand { min: 0.0, max: 95.0 },
            priority: 1,
        };
        assert!(RegionRuleSet::new(vec![band, RegionRule::anywhere("X", 2)]).is_err());

        let unnamed = RegionRule::bounding_box("  ", 1, (0.0, 1.0), (0.0, 1.0));
        assert!(RegionRuleSet::new(vec![unnamed, RegionRule::anywhere("X", 2)]).is_err());
    }

    #[test]
    fn test_band_predicates() {
        let lat = RegionPredicate::LatitudeBand { min: 60.0, max: 72.0 };
        assert!(lat.matches(65.0, 170.0));
        assert!(!lat.matches(59.9, 10.0));

        let lon = RegionPredicate::LongitudeBand { min: -25.0, max: 50.0 };
        assert!(lon.matches(-80.0, 0.0));
        assert!(!lon.matches(0.0, 50.1));

        assert!(RegionPredicate::Anywhere.matches(f64::NAN, f64::NAN));
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"rules":[{"name":"A","predicate":{"BoundingBox":{"lat_min":0.0,"lat_max":1.0,"lon_min":0.0,"lon_max":1.0}},"priority":1}]}"#;
        assert!(serde_json::from_str::<RegionRuleSet>(json).is_err());

        let round_trip = serde_json::to_string(&RegionRuleSet::europe()).unwrap();
        let parsed: RegionRuleSet = serde_json::from_str(&round_trip).unwrap();
        assert_eq!(parsed, RegionRuleSet::europe());
    }
}
