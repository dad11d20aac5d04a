//! Question, answer and form-field types

use crate::error::{AnswerError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Question text exactly as extracted from a form. Used verbatim as a store key.
pub type Question = String;

/// Kind of form field, which decides the store and resolution strategy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Free-text input
    FreeText,
    /// Yes/No radio group
    Binary,
    /// Dropdown with a fixed set of option labels
    SingleChoice,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::FreeText, Category::Binary, Category::SingleChoice];

    /// File name of the backing table inside a data directory
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Category::FreeText => "answers.json",
            Category::Binary => "binary_response.json",
            Category::SingleChoice => "dropdown_response.json",
        }
    }

    /// Whether the backing file has to exist before startup
    pub fn requires_existing_store(&self) -> bool {
        matches!(self, Category::FreeText)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::FreeText => write!(f, "free_text"),
            Category::Binary => write!(f, "binary"),
            Category::SingleChoice => write!(f, "single_choice"),
        }
    }
}

/// Canonical answer for a binary question
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BinaryAnswer {
    Yes,
    No,
}

impl BinaryAnswer {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryAnswer::Yes => "Yes",
            BinaryAnswer::No => "No",
        }
    }
}

impl FromStr for BinaryAnswer {
    type Err = AnswerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "yes" => Ok(BinaryAnswer::Yes),
            "no" => Ok(BinaryAnswer::No),
            other => Err(AnswerError::InvalidAnswer(format!(
                "expected Yes or No, got \"{other}\""
            ))),
        }
    }
}

impl std::fmt::Display for BinaryAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best stored question found for an incoming one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionMatch {
    /// Stored question (store key)
    pub question: Question,
    /// Similarity score; 1.0 for an exact key match, unbounded otherwise
    pub similarity: f64,
    /// Whether the incoming text was identical to the stored key
    pub exact: bool,
}

impl QuestionMatch {
    pub fn exact(question: impl Into<Question>) -> Self {
        Self {
            question: question.into(),
            similarity: 1.0,
            exact: true,
        }
    }

    pub fn scored(question: impl Into<Question>, similarity: f64) -> Self {
        Self {
            question: question.into(),
            similarity,
            exact: false,
        }
    }
}

/// A form field handed over by the form driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    /// Label text of the field
    pub question: Question,
    /// Field kind
    pub category: Category,
    /// Option labels presented for a single-choice field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FormField {
    pub fn new(question: impl Into<Question>, category: Category) -> Self {
        Self {
            question: question.into(),
            category,
            options: Vec::new(),
        }
    }

    /// Set the presented option labels
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Option label matching `value`, if options were presented
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.eq_ignore_ascii_case(value.trim()))
            .map(String::as_str)
    }
}

/// Where an applied answer came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnswerOrigin {
    /// Stored under the identical question text
    Exact,
    /// Reused from a similar stored question
    Reused { matched: Question, similarity: f64 },
    /// Newly obtained and persisted; `nearest` is a match that was reported
    /// but not trusted enough to reuse
    Resolved { nearest: Option<QuestionMatch> },
}

/// Answer for a form field plus its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAnswer {
    pub value: String,
    pub origin: AnswerOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_answer_is_canonicalized() {
        assert_eq!("yes".parse::<BinaryAnswer>().unwrap(), BinaryAnswer::Yes);
        assert_eq!(" NO ".parse::<BinaryAnswer>().unwrap(), BinaryAnswer::No);
        assert_eq!(BinaryAnswer::Yes.to_string(), "Yes");
        assert!("maybe".parse::<BinaryAnswer>().is_err());
    }

    #[test]
    fn only_free_text_store_is_required() {
        assert!(Category::FreeText.requires_existing_store());
        assert!(!Category::Binary.requires_existing_store());
        assert!(!Category::SingleChoice.requires_existing_store());
    }

    #[test]
    fn option_label_matches_case_insensitively() {
        let field = FormField::new("Degree", Category::SingleChoice)
            .with_options(["Bachelor's", "Master's"]);
        assert_eq!(field.option_label("master's"), Some("Master's"));
        assert_eq!(field.option_label("PhD"), None);
    }
}
