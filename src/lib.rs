//! # Answerbook - question-answer memory for application forms
//!
//! Maps a freshly encountered form question to a previously stored answer
//! using lexical similarity, decides whether the match is trustworthy enough
//! to reuse, and otherwise obtains a new answer and persists it.

pub mod config;
pub mod confidence;
pub mod error;
pub mod keywords;
pub mod matcher;
pub mod normalize;
pub mod resolver;
pub mod similarity;
pub mod store;
pub mod types;

pub use config::{AnswerBookConfig, StoreFiles, CONFIG_FILE_NAME};
pub use confidence::ConfidenceTier;
pub use error::{AnswerError, Result};
pub use keywords::{KeywordSet, DEFAULT_KEYWORDS};
pub use matcher::{MatcherConfig, MatcherConfigBuilder, QuestionMatcher};
pub use normalize::{normalize, TextNormalizer, DEFAULT_PREFIXES};
pub use resolver::{
    BinaryProbe, ChoiceProbe, LinePrompt, OperatorPrompt, Resolver, ResolverConfig,
    ResolverConfigBuilder, WatchedSelection, DEFAULT_CHOICE_PLACEHOLDER,
};
pub use similarity::{Similarity, TfIdfScorer};
pub use store::AnswerStore;
pub use types::{
    AnswerOrigin, BinaryAnswer, Category, FieldAnswer, FormField, Question, QuestionMatch,
};

use std::sync::Arc;
use tracing::{info, warn};

/// Main answer memory: the three stores plus matching and resolution
pub struct AnswerBook {
    free_text: AnswerStore,
    binary: AnswerStore,
    single_choice: AnswerStore,
    matcher: QuestionMatcher,
    resolver: Resolver,
    prompt: Option<Box<dyn OperatorPrompt>>,
    binary_probe: Option<Arc<dyn BinaryProbe>>,
    choice_probe: Option<Arc<dyn ChoiceProbe>>,
}

impl std::fmt::Debug for AnswerBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerBook")
            .field("free_text", &self.free_text.len())
            .field("binary", &self.binary.len())
            .field("single_choice", &self.single_choice.len())
            .field("matcher", self.matcher.config())
            .finish()
    }
}

impl AnswerBook {
    /// Load all three stores. Fails if the free-text store file is missing.
    pub fn open(config: &AnswerBookConfig) -> Result<Self> {
        config.validate()?;

        let free_text = AnswerStore::open(config.store_path(Category::FreeText), Category::FreeText)?;
        let binary = AnswerStore::open(config.store_path(Category::Binary), Category::Binary)?;
        let single_choice =
            AnswerStore::open(config.store_path(Category::SingleChoice), Category::SingleChoice)?;

        info!(
            free_text = free_text.len(),
            binary = binary.len(),
            single_choice = single_choice.len(),
            "Answer stores loaded"
        );

        Ok(Self {
            free_text,
            binary,
            single_choice,
            matcher: QuestionMatcher::new(config.matcher.clone()),
            resolver: Resolver::new(config.resolver.clone()),
            prompt: None,
            binary_probe: None,
            choice_probe: None,
        })
    }

    /// Attach the operator prompt used for free-text questions
    pub fn with_prompt(mut self, prompt: impl OperatorPrompt + 'static) -> Self {
        self.prompt = Some(Box::new(prompt));
        self
    }

    /// Attach the observed Yes/No state used for binary questions
    pub fn with_binary_probe(mut self, probe: impl BinaryProbe + 'static) -> Self {
        self.binary_probe = Some(Arc::new(probe));
        self
    }

    /// Attach the observed dropdown value used for single-choice questions
    pub fn with_choice_probe(mut self, probe: impl ChoiceProbe + 'static) -> Self {
        self.choice_probe = Some(Arc::new(probe));
        self
    }

    /// Normalized comparison form of a question
    pub fn normalize(&self, question: &str) -> String {
        self.matcher.scorer().normalizer().normalize(question)
    }

    /// Similarity of `a` against `b`
    pub fn score(&self, a: &str, b: &str) -> f64 {
        self.matcher.scorer().score(a, b)
    }

    /// Best stored question of `category` for `question`, if any reaches the floor
    pub fn match_question(&self, question: &str, category: Category) -> Option<QuestionMatch> {
        self.matcher.find(question, self.store(category))
    }

    /// Candidates of `category` in ranking order, for inspection
    pub fn rank(&self, question: &str, category: Category) -> Vec<QuestionMatch> {
        self.matcher.rank(question, self.store(category))
    }

    /// Confidence tier of a match result under the configured thresholds
    pub fn tier(&self, result: Option<&QuestionMatch>) -> ConfidenceTier {
        ConfidenceTier::classify(result, self.matcher.config())
    }

    /// Stored answer for the exact question text
    pub fn get_answer(&self, question: &str, category: Category) -> Option<&str> {
        self.store(category).get(question)
    }

    /// Store an answer and persist its table
    pub fn put_answer(
        &mut self,
        question: impl Into<String>,
        category: Category,
        answer: impl Into<String>,
    ) -> Result<()> {
        self.store_mut(category).put(question, answer)
    }

    pub fn store(&self, category: Category) -> &AnswerStore {
        match category {
            Category::FreeText => &self.free_text,
            Category::Binary => &self.binary,
            Category::SingleChoice => &self.single_choice,
        }
    }

    fn store_mut(&mut self, category: Category) -> &mut AnswerStore {
        match category {
            Category::FreeText => &mut self.free_text,
            Category::Binary => &mut self.binary,
            Category::SingleChoice => &mut self.single_choice,
        }
    }

    pub fn matcher(&self) -> &QuestionMatcher {
        &self.matcher
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Let resolution continue after a cancellation
    pub fn reset_cancellation(&mut self) {
        self.resolver.reset();
    }

    /// Obtain a new answer from the attached prompt or probe and persist it
    pub async fn resolve(&mut self, question: &str, category: Category) -> Result<String> {
        match category {
            Category::FreeText => {
                let prompt = self.prompt.as_deref_mut().ok_or_else(|| {
                    AnswerError::Configuration("no operator prompt attached".into())
                })?;
                self.resolver
                    .resolve_free_text(question, &mut self.free_text, prompt)
                    .await
            }
            Category::Binary => {
                let probe = self.binary_probe.clone().ok_or_else(|| {
                    AnswerError::Configuration("no binary probe attached".into())
                })?;
                let answer = self
                    .resolver
                    .resolve_binary(question, &mut self.binary, probe.as_ref())
                    .await?;
                Ok(answer.to_string())
            }
            Category::SingleChoice => {
                let probe = self.choice_probe.clone().ok_or_else(|| {
                    AnswerError::Configuration("no choice probe attached".into())
                })?;
                self.resolver
                    .resolve_choice(question, &mut self.single_choice, probe.as_ref())
                    .await
            }
        }
    }

    /// Answer a form field: reuse a trusted stored answer, otherwise resolve
    /// a new one. Uncertain matches are reported but never applied.
    pub async fn answer(&mut self, field: &FormField) -> Result<FieldAnswer> {
        let question = field.question.as_str();
        let found = self.match_question(question, field.category);
        let tier = self.tier(found.as_ref());

        if let Some(m) = found.as_ref().filter(|_| tier.is_reusable()) {
            if let Some(value) = self.stored_value(field, &m.question) {
                let origin = if m.exact {
                    AnswerOrigin::Exact
                } else {
                    info!(question, matched = %m.question, similarity = m.similarity, "Reusing answer of similar question");
                    AnswerOrigin::Reused {
                        matched: m.question.clone(),
                        similarity: m.similarity,
                    }
                };
                return Ok(FieldAnswer { value, origin });
            }
        }

        if let (ConfidenceTier::Uncertain, Some(m)) = (tier, found.as_ref()) {
            warn!(
                question,
                matched = %m.question,
                similarity = m.similarity,
                "Similar question found but not confident enough to reuse"
            );
        }

        let value = self.resolve(question, field.category).await?;
        Ok(FieldAnswer {
            value,
            origin: AnswerOrigin::Resolved { nearest: found },
        })
    }

    /// Stored answer of `matched`, checked against the field's option labels
    fn stored_value(&self, field: &FormField, matched: &str) -> Option<String> {
        let value = self.store(field.category).get(matched)?;
        if field.category != Category::SingleChoice || field.options.is_empty() {
            return Some(value.to_string());
        }
        match field.option_label(value) {
            Some(label) => Some(label.to_string()),
            None => {
                warn!(question = %field.question, stored = value, "Stored choice is not among the presented options");
                None
            }
        }
    }
}
