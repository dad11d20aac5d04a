//! Question matching against a stored answer table
//!
//! Ranking happens in strict priority order:
//! 1. identical key text short-circuits with similarity 1.0
//! 2. stored questions mentioning a domain keyword are scored, boosted when
//!    the incoming question mentions one too
//! 3. only when no stored question mentions a keyword are the remaining
//!    questions scored, without boost
//! 4. the best candidate is dropped if it scores below the acceptance floor

use crate::keywords::KeywordSet;
use crate::similarity::{Similarity, TfIdfScorer};
use crate::store::AnswerStore;
use crate::types::QuestionMatch;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Matcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Scores below this are treated as no match
    pub acceptance_floor: f64,
    /// Scores strictly above this are safe to reuse without asking
    pub reuse_threshold: f64,
    /// Multiplier for keyword candidates when the incoming question has a keyword
    pub keyword_boost: f64,
    /// Added to the built-in keyword vocabulary
    pub extra_keywords: Vec<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            acceptance_floor: 0.4,
            reuse_threshold: 0.7,
            keyword_boost: 1.2,
            extra_keywords: Vec::new(),
        }
    }
}

/// Configuration builder
#[derive(Debug, Default)]
pub struct MatcherConfigBuilder {
    config: MatcherConfig,
}

impl MatcherConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acceptance_floor(mut self, floor: f64) -> Self {
        self.config.acceptance_floor = floor;
        self
    }

    pub fn reuse_threshold(mut self, threshold: f64) -> Self {
        self.config.reuse_threshold = threshold;
        self
    }

    pub fn keyword_boost(mut self, boost: f64) -> Self {
        self.config.keyword_boost = boost;
        self
    }

    pub fn extra_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.config.extra_keywords.push(keyword.into());
        self
    }

    pub fn build(self) -> MatcherConfig {
        self.config
    }
}

/// Finds the stored question closest to an incoming one
#[derive(Debug)]
pub struct QuestionMatcher<S: Similarity = TfIdfScorer> {
    scorer: S,
    keywords: KeywordSet,
    config: MatcherConfig,
}

impl Default for QuestionMatcher {
    fn default() -> Self {
        Self::new(MatcherConfig::default())
    }
}

impl QuestionMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self::with_scorer(TfIdfScorer::default(), config)
    }
}

impl<S: Similarity> QuestionMatcher<S> {
    pub fn with_scorer(scorer: S, config: MatcherConfig) -> Self {
        let mut keywords = KeywordSet::default();
        keywords.extend(&config.extra_keywords);
        Self {
            scorer,
            keywords,
            config,
        }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    /// Best match for `question` among the keys of `store`
    pub fn find(&self, question: &str, store: &AnswerStore) -> Option<QuestionMatch> {
        self.find_among(question, store.questions())
    }

    /// Best match for `question` among `stored` questions
    pub fn find_among<'a, I>(&self, question: &str, stored: I) -> Option<QuestionMatch>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let stored: Vec<&str> = stored.into_iter().collect();
        if stored.is_empty() {
            return None;
        }

        if stored.iter().any(|q| *q == question) {
            return Some(QuestionMatch::exact(question));
        }

        let (with_keyword, without_keyword): (Vec<&str>, Vec<&str>) = stored
            .into_iter()
            .partition(|q| self.keywords.contains_any(q));

        let boost = if self.keywords.contains_any(question) {
            self.config.keyword_boost
        } else {
            1.0
        };

        let best = self
            .best_of(question, &with_keyword, boost)
            .or_else(|| self.best_of(question, &without_keyword, 1.0))?;

        if best.similarity < self.config.acceptance_floor {
            debug!(
                question,
                best = %best.question,
                similarity = best.similarity,
                "Best candidate below acceptance floor"
            );
            return None;
        }

        Some(best)
    }

    /// All candidates of the pool that would be searched, best first
    pub fn rank(&self, question: &str, store: &AnswerStore) -> Vec<QuestionMatch> {
        let (with_keyword, without_keyword): (Vec<&str>, Vec<&str>) = store
            .questions()
            .partition(|q| self.keywords.contains_any(q));

        let mut ranked: Vec<QuestionMatch> = if with_keyword.is_empty() {
            self.scored(question, &without_keyword, 1.0).collect()
        } else {
            let boost = if self.keywords.contains_any(question) {
                self.config.keyword_boost
            } else {
                1.0
            };
            self.scored(question, &with_keyword, boost).collect()
        };

        ranked.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.question.cmp(&b.question))
        });
        ranked
    }

    fn scored<'c>(
        &'c self,
        question: &'c str,
        candidates: &'c [&'c str],
        factor: f64,
    ) -> impl Iterator<Item = QuestionMatch> + 'c {
        candidates.iter().map(move |candidate| {
            let similarity = self.scorer.score(question, candidate) * factor;
            QuestionMatch::scored(*candidate, similarity)
        })
    }

    /// Highest scoring candidate; the first one wins ties
    fn best_of(&self, question: &str, candidates: &[&str], factor: f64) -> Option<QuestionMatch> {
        let mut best: Option<QuestionMatch> = None;
        for candidate in self.scored(question, candidates, factor) {
            debug!(
                candidate = %candidate.question,
                similarity = candidate.similarity,
                boosted = factor != 1.0,
                "Scored candidate"
            );
            if best
                .as_ref()
                .map_or(true, |b| candidate.similarity > b.similarity)
            {
                best = Some(candidate);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Scores by looking up the stored question
    struct FixedScorer(HashMap<&'static str, f64>);

    impl FixedScorer {
        fn new(scores: &[(&'static str, f64)]) -> Self {
            Self(scores.iter().copied().collect())
        }
    }

    impl Similarity for FixedScorer {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn score(&self, _a: &str, b: &str) -> f64 {
            self.0.get(b).copied().unwrap_or(0.0)
        }
    }

    fn matcher(scores: &[(&'static str, f64)]) -> QuestionMatcher<FixedScorer> {
        QuestionMatcher::with_scorer(FixedScorer::new(scores), MatcherConfig::default())
    }

    #[test]
    fn test_exact_match_short_circuits() {
        let m = matcher(&[]);
        let found = m
            .find_among("Are you willing to relocate?", ["Are you willing to relocate?"])
            .unwrap();
        assert_eq!(found, QuestionMatch::exact("Are you willing to relocate?"));
        assert_eq!(found.similarity, 1.0);
    }

    #[test]
    fn test_empty_store_is_no_match() {
        let m = QuestionMatcher::new(MatcherConfig::default());
        assert!(m.find_among("Anything at all", []).is_none());
    }

    #[test]
    fn test_acceptance_floor_is_inclusive() {
        let at_floor = matcher(&[("Notice period in weeks", 0.4)]);
        let found = at_floor.find_among("When can you start", ["Notice period in weeks"]);
        assert_eq!(found.unwrap().similarity, 0.4);

        let below = matcher(&[("Notice period in weeks", 0.39999)]);
        assert!(below
            .find_among("When can you start", ["Notice period in weeks"])
            .is_none());
    }

    #[test]
    fn test_keyword_candidate_outranks_plain_candidate() {
        let m = matcher(&[
            ("Years of experience with Java", 0.5),
            ("Years of experience with Jxva", 0.5),
        ]);
        let found = m
            .find_among(
                "Experience with Java?",
                ["Years of experience with Jxva", "Years of experience with Java"],
            )
            .unwrap();
        assert_eq!(found.question, "Years of experience with Java");
        assert!((found.similarity - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_no_boost_without_incoming_keyword() {
        let m = matcher(&[("Years of experience with Java", 0.5)]);
        let found = m
            .find_among("Years of experience overall", ["Years of experience with Java"])
            .unwrap();
        assert_eq!(found.similarity, 0.5);
    }

    #[test]
    fn test_falls_back_to_plain_questions() {
        let m = matcher(&[("Desired salary", 0.9), ("Notice period", 0.5)]);
        let found = m
            .find_among("Salary expectation", ["Notice period", "Desired salary"])
            .unwrap();
        assert_eq!(found.question, "Desired salary");
        assert_eq!(found.similarity, 0.9);
    }

    #[test]
    fn test_keyword_pool_blocks_fallback() {
        // A keyword pool exists, so plain questions are never considered
        let m = matcher(&[("Experience with Docker", 0.1), ("Desired salary", 0.9)]);
        assert!(m
            .find_among("Salary expectation", ["Experience with Docker", "Desired salary"])
            .is_none());
    }

    #[test]
    fn test_first_candidate_wins_ties() {
        let m = matcher(&[("Notice period", 0.5), ("Start date", 0.5)]);
        let found = m
            .find_among("When can you join", ["Start date", "Notice period"])
            .unwrap();
        assert_eq!(found.question, "Start date");
    }

    #[test]
    fn test_builder_sets_thresholds() {
        let config = MatcherConfigBuilder::new()
            .acceptance_floor(0.3)
            .reuse_threshold(0.8)
            .keyword_boost(1.5)
            .extra_keyword("Rust")
            .build();
        let m = QuestionMatcher::new(config);
        assert_eq!(m.config().acceptance_floor, 0.3);
        assert!(m.keywords().contains_any("rust experience"));
    }

    #[test]
    fn test_keyword_pool_split_with_tfidf() {
        let m = QuestionMatcher::new(MatcherConfig::default());
        let docker = "Years of Docker experience";
        let plain = "Years of management experience";
        let stored = [docker, plain];

        // No keyword in the incoming question: the plain question overlaps more
        // but only the keyword pool is searched, unboosted
        let incoming = "Container management experience in years";
        let found = m.find_among(incoming, stored).unwrap();
        assert_eq!(found.question, docker);
        assert_eq!(found.similarity, m.scorer().score(incoming, docker));
        assert!(m.scorer().score(incoming, plain) > found.similarity);

        // Same question naming the keyword gets the boost
        let incoming = "Docker management experience in years";
        let found = m.find_among(incoming, stored).unwrap();
        assert_eq!(found.question, docker);
        let expected = m.scorer().score(incoming, docker) * 1.2;
        assert!((found.similarity - expected).abs() < 1e-12);
    }
}
