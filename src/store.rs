//! Answer tables persisted as flat JSON objects
//!
//! Each store owns its in-memory map and mirrors it to one JSON file mapping
//! question text to answer text. Every `put` rewrites the whole file before
//! returning, so a resolved answer is durable before the next field is read.

use crate::error::{AnswerError, Result};
use crate::types::{BinaryAnswer, Category};

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Question-to-answer table for one category
#[derive(Debug, Clone)]
pub struct AnswerStore {
    category: Category,
    path: PathBuf,
    answers: BTreeMap<String, String>,
}

impl AnswerStore {
    /// Load the store for `category` from `path`.
    ///
    /// A missing free-text file is a fatal [`AnswerError::MissingStore`];
    /// missing binary and single-choice files are created empty.
    pub fn open(path: impl AsRef<Path>, category: Category) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            if category.requires_existing_store() {
                return Err(AnswerError::MissingStore { path });
            }
            info!(path = %path.display(), %category, "Answer store not found, creating an empty one");
            let store = Self::empty(path, category);
            store.flush()?;
            return Ok(store);
        }

        let data = std::fs::read_to_string(&path)?;
        let mut answers: BTreeMap<String, String> = serde_json::from_str(&data)?;
        for (question, answer) in answers.iter_mut() {
            *answer = canonical(category, std::mem::take(answer)).map_err(|e| {
                AnswerError::InvalidAnswer(format!(
                    "{} entry \"{question}\": {e}",
                    path.display()
                ))
            })?;
        }
        debug!(path = %path.display(), %category, entries = answers.len(), "Loaded answer store");

        Ok(Self {
            category,
            path,
            answers,
        })
    }

    /// Create an empty, not yet flushed store
    pub fn empty(path: impl Into<PathBuf>, category: Category) -> Self {
        Self {
            category,
            path: path.into(),
            answers: BTreeMap::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Stored answer for the exact question text
    pub fn get(&self, question: &str) -> Option<&str> {
        self.answers.get(question).map(String::as_str)
    }

    pub fn contains(&self, question: &str) -> bool {
        self.answers.contains_key(question)
    }

    /// Stored questions, in key order
    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.answers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.answers.iter().map(|(q, a)| (q.as_str(), a.as_str()))
    }

    /// Store an answer and persist the whole table. Last write wins.
    ///
    /// If the file cannot be written the in-memory table is left as it was.
    pub fn put(&mut self, question: impl Into<String>, answer: impl Into<String>) -> Result<()> {
        let question = question.into();
        let answer = canonical(self.category, answer.into())?;

        let previous = self.answers.insert(question.clone(), answer.clone());
        if let Err(e) = self.flush() {
            match previous {
                Some(old) => self.answers.insert(question, old),
                None => self.answers.remove(&question),
            };
            return Err(e);
        }

        info!(%question, %answer, category = %self.category, "Stored answer");
        Ok(())
    }

    /// Re-read the table from disk, dropping unsaved state
    pub fn reload(&mut self) -> Result<()> {
        *self = Self::open(&self.path, self.category)?;
        Ok(())
    }

    /// Rewrite the backing file with the full table
    pub fn flush(&self) -> Result<()> {
        let persist_err = |source: std::io::Error| AnswerError::Persist {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(persist_err)?;

        let json = serde_json::to_string_pretty(&self.answers)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(persist_err)?;
        tmp.write_all(json.as_bytes()).map_err(persist_err)?;
        tmp.as_file().sync_all().map_err(persist_err)?;
        tmp.persist(&self.path).map_err(|e| persist_err(e.error))?;

        Ok(())
    }
}

/// Stored form of `answer`; binary answers become `Yes` or `No`
fn canonical(category: Category, answer: String) -> Result<String> {
    match category {
        Category::Binary => Ok(answer.parse::<BinaryAnswer>()?.as_str().to_string()),
        Category::FreeText | Category::SingleChoice => Ok(answer),
    }
}
