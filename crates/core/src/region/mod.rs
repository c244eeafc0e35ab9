//! European subregion classification
//!
//! - `rules`: predicates, rules and the validated, priority-ordered rule set
//! - `classifier`: first-match classification over a rule set

pub mod classifier;
pub mod rules;

pub use classifier::RegionClassifier;
pub use rules::{RegionPredicate, RegionRule, RegionRuleSet, UNCLASSIFIED};
