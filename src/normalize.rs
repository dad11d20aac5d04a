//! Question normalization: boilerplate stripping, tokenization and stemming
//!
//! The normalized form is only used for comparison. Store keys always keep
//! the raw question text.

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};

/// Leading phrases that carry no information about what is being asked.
/// Order matters: the first prefix that matches is the only one removed.
pub const DEFAULT_PREFIXES: &[&str] = &[
    "how many years of work experience do you have with",
    "how many years of do you have with",
    "how many years of do you have",
];

static DEFAULT_NORMALIZER: Lazy<TextNormalizer> = Lazy::new(TextNormalizer::default);

/// Normalize with the default prefix list
pub fn normalize(question: &str) -> String {
    DEFAULT_NORMALIZER.normalize(question)
}

/// Split text into word units (letters, digits and underscores)
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
}

/// Rule-based normalizer turning a question into a stemmed token string
pub struct TextNormalizer {
    prefixes: Vec<String>,
    stemmer: Stemmer,
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("prefixes", &self.prefixes)
            .field("stemmer", &"<english>")
            .finish()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::with_prefixes(DEFAULT_PREFIXES.iter().copied())
    }
}

impl TextNormalizer {
    /// Create a normalizer with a custom prefix list (matched case-insensitively)
    pub fn with_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Strip the first matching boilerplate prefix. Input must already be lowercase.
    fn strip_prefix<'a>(&self, lowered: &'a str) -> &'a str {
        self.prefixes
            .iter()
            .find_map(|p| lowered.strip_prefix(p.as_str()))
            .unwrap_or(lowered)
    }

    /// Stemmed tokens of a question, in order
    pub fn tokens(&self, question: &str) -> Vec<String> {
        let lowered = question.to_lowercase();
        tokenize(self.strip_prefix(&lowered))
            .map(|token| self.stemmer.stem(token).into_owned())
            .collect()
    }

    /// Normalized comparison form: stemmed tokens joined by single spaces
    pub fn normalize(&self, question: &str) -> String {
        self.tokens(question).join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_never_leaks() {
        let long = normalize("How many years of work experience do you have with Java?");
        let short = normalize("Java?");
        assert_eq!(long, short);
        assert_eq!(short, "java");
    }

    #[test]
    fn test_only_first_prefix_removed() {
        // "...do you have with" matches before the shorter "...do you have"
        let n = normalize("How many years of do you have with Docker");
        assert_eq!(n, "docker");
    }

    #[test]
    fn test_prefix_is_anchored() {
        let n = normalize("Tell us how many years of work experience do you have with Rust");
        assert!(n.starts_with("tell us how"));
        assert!(n.ends_with("rust"));
    }

    #[test]
    fn test_stemming_and_case() {
        assert_eq!(normalize("Years of EXPERIENCE"), "year of experi");
        assert_eq!(normalize("I love Python"), normalize("i LOVE python"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("?!"), "");
    }

    #[test]
    fn test_tokenize_splits_punctuation() {
        let tokens: Vec<&str> = tokenize("node.js, C++ & spring_boot").collect();
        assert_eq!(tokens, vec!["node", "js", "C", "spring_boot"]);
    }
}
