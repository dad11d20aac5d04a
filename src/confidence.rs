//! Match confidence tiers
//!
//! A match has two thresholds. Anything at or above the acceptance floor is
//! worth reporting; only a match strictly above the reuse threshold is safe
//! to apply without asking the operator.

use crate::matcher::MatcherConfig;
use crate::types::QuestionMatch;
use serde::{Deserialize, Serialize};

/// Confidence tiers for a match result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ConfidenceTier {
    /// Identical question text
    Exact,
    /// Above the reuse threshold
    Reusable,
    /// Between the acceptance floor and the reuse threshold (inclusive)
    Uncertain,
    /// No match at or above the acceptance floor
    Unreliable,
}

impl ConfidenceTier {
    /// Classify a matcher result
    pub fn classify(result: Option<&QuestionMatch>, config: &MatcherConfig) -> Self {
        match result {
            None => ConfidenceTier::Unreliable,
            Some(m) if m.exact => ConfidenceTier::Exact,
            Some(m) if m.similarity > config.reuse_threshold => ConfidenceTier::Reusable,
            Some(m) if m.similarity >= config.acceptance_floor => ConfidenceTier::Uncertain,
            Some(_) => ConfidenceTier::Unreliable,
        }
    }

    /// Whether the stored answer may be applied automatically
    pub fn is_reusable(&self) -> bool {
        matches!(self, ConfidenceTier::Exact | ConfidenceTier::Reusable)
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceTier::Exact => write!(f, "exact"),
            ConfidenceTier::Reusable => write!(f, "reusable"),
            ConfidenceTier::Uncertain => write!(f, "uncertain"),
            ConfidenceTier::Unreliable => write!(f, "unreliable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        let config = MatcherConfig::default();
        let tier = |s: f64| ConfidenceTier::classify(Some(&QuestionMatch::scored("q", s)), &config);

        assert_eq!(tier(0.71), ConfidenceTier::Reusable);
        assert_eq!(tier(0.7), ConfidenceTier::Uncertain);
        assert_eq!(tier(0.4), ConfidenceTier::Uncertain);
        assert_eq!(tier(0.39), ConfidenceTier::Unreliable);
        assert_eq!(ConfidenceTier::classify(None, &config), ConfidenceTier::Unreliable);
    }

    #[test]
    fn test_exact_is_reusable() {
        let config = MatcherConfig::default();
        let tier = ConfidenceTier::classify(Some(&QuestionMatch::exact("q")), &config);
        assert_eq!(tier, ConfidenceTier::Exact);
        assert!(tier.is_reusable());
        assert!(!ConfidenceTier::Uncertain.is_reusable());
    }
}
