//! Two-document TF-IDF similarity between questions
//!
//! The two questions being compared form the whole corpus. Each term is
//! weighted by its raw count in its own document times
//! `idf = 1 + ln(N / (1 + df))` with `N = 2`, and the score is the dot product
//! of the two weight vectors over the terms of the first question.
//!
//! The score is not cosine-normalized. It grows with question length and term
//! repetition, so it is only meaningful for ranking candidates against one
//! incoming question, never as an absolute measure across unrelated calls.

use crate::normalize::TextNormalizer;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashSet};

/// Terms dropped from both documents before weighting
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let words = [
        "about", "above", "after", "again", "all", "also", "am", "an", "and", "another", "any",
        "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
        "both", "but", "by", "came", "can", "cannot", "come", "could", "did", "do", "does",
        "doing", "during", "each", "few", "for", "from", "further", "get", "got", "has", "had",
        "he", "have", "her", "here", "him", "himself", "his", "how", "if", "in", "into", "is",
        "it", "its", "itself", "like", "make", "many", "me", "might", "more", "most", "much",
        "must", "my", "myself", "never", "now", "of", "on", "only", "or", "other", "our",
        "ours", "ourselves", "out", "over", "own", "said", "same", "see", "should", "since",
        "so", "some", "still", "such", "take", "than", "that", "the", "their", "theirs",
        "them", "themselves", "then", "there", "these", "they", "this", "those", "through",
        "to", "too", "under", "until", "up", "very", "was", "way", "we", "well", "were",
        "what", "where", "when", "which", "while", "who", "whom", "with", "would", "why",
        "you", "your", "yours", "yourself", "_",
    ];
    words.into_iter().collect()
});

fn is_stopword(term: &str) -> bool {
    // Single letters and digits carry nothing on their own
    term.chars().count() == 1 || STOPWORDS.contains(term)
}

/// Scores how close two questions are
pub trait Similarity: Send + Sync {
    fn name(&self) -> &'static str;

    /// Unnormalized similarity of `a` against `b`, always >= 0
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Term counts of one normalized question
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermCounts(BTreeMap<String, u32>);

impl TermCounts {
    fn from_tokens<I: IntoIterator<Item = String>>(tokens: I) -> Self {
        let mut counts = BTreeMap::new();
        for token in tokens {
            if !is_stopword(&token) {
                *counts.entry(token).or_insert(0) += 1;
            }
        }
        Self(counts)
    }

    pub fn get(&self, term: &str) -> u32 {
        self.0.get(term).copied().unwrap_or(0)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(t, c)| (t.as_str(), *c))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Inverse document frequency over a corpus of `docs` documents
fn idf(docs: usize, docs_with_term: usize) -> f64 {
    1.0 + (docs as f64 / (1.0 + docs_with_term as f64)).ln()
}

/// TF-IDF scorer over the normalized forms of exactly two questions
#[derive(Debug, Default)]
pub struct TfIdfScorer {
    normalizer: TextNormalizer,
}

impl TfIdfScorer {
    pub fn new(normalizer: TextNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Stopword-filtered term counts of a question's normalized form
    pub fn term_counts(&self, question: &str) -> TermCounts {
        TermCounts::from_tokens(self.normalizer.tokens(question))
    }

    /// Dot product of TF-IDF weights over the terms of `a`
    pub fn score_counts(a: &TermCounts, b: &TermCounts) -> f64 {
        const DOCS: usize = 2;

        a.terms()
            .map(|(term, tf_a)| {
                let tf_b = b.get(term);
                if tf_b == 0 {
                    return 0.0;
                }
                // present in `a` by construction, and in `b`
                let weight = idf(DOCS, 2);
                (tf_a as f64 * weight) * (tf_b as f64 * weight)
            })
            .sum()
    }
}

impl Similarity for TfIdfScorer {
    fn name(&self) -> &'static str {
        "tfidf"
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        Self::score_counts(&self.term_counts(a), &self.term_counts(b))
    }
}
