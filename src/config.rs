//! Answerbook configuration
//!
//! Loaded from an optional JSON file; every field has a default so a partial
//! file only overrides what it names.

use crate::error::{AnswerError, Result};
use crate::matcher::MatcherConfig;
use crate::resolver::ResolverConfig;
use crate::types::Category;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name inside a data directory
pub const CONFIG_FILE_NAME: &str = "answerbook.json";

/// Backing file of each store. Relative paths resolve against the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreFiles {
    pub free_text: PathBuf,
    pub binary: PathBuf,
    pub single_choice: PathBuf,
}

impl Default for StoreFiles {
    fn default() -> Self {
        Self {
            free_text: Category::FreeText.default_file_name().into(),
            binary: Category::Binary.default_file_name().into(),
            single_choice: Category::SingleChoice.default_file_name().into(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerBookConfig {
    /// Directory holding the store files
    pub data_dir: PathBuf,
    pub stores: StoreFiles,
    pub matcher: MatcherConfig,
    pub resolver: ResolverConfig,
}

impl Default for AnswerBookConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            stores: StoreFiles::default(),
            matcher: MatcherConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl AnswerBookConfig {
    /// Read a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            AnswerError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|e| {
            AnswerError::Configuration(format!("invalid config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write this config as indented JSON
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Resolved backing file for a category
    pub fn store_path(&self, category: Category) -> PathBuf {
        let file = match category {
            Category::FreeText => &self.stores.free_text,
            Category::Binary => &self.stores.binary,
            Category::SingleChoice => &self.stores.single_choice,
        };
        if file.is_absolute() {
            file.clone()
        } else {
            self.data_dir.join(file)
        }
    }

    /// Reject threshold combinations the matcher cannot honour
    pub fn validate(&self) -> Result<()> {
        let m = &self.matcher;
        if m.acceptance_floor < 0.0 || m.keyword_boost <= 0.0 {
            return Err(AnswerError::Configuration(
                "acceptance_floor must be >= 0 and keyword_boost > 0".into(),
            ));
        }
        if m.reuse_threshold < m.acceptance_floor {
            return Err(AnswerError::Configuration(format!(
                "reuse_threshold {} is below acceptance_floor {}",
                m.reuse_threshold, m.acceptance_floor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{ "matcher": { "reuse_threshold": 0.8 } }"#).unwrap();

        let config = AnswerBookConfig::from_file(&path).unwrap();
        assert_eq!(config.matcher.reuse_threshold, 0.8);
        assert_eq!(config.matcher.acceptance_floor, 0.4);
        assert_eq!(config.resolver.choice_poll_interval_ms, 500);
        assert_eq!(config.stores, StoreFiles::default());
    }

    #[test]
    fn test_store_paths_resolve_against_data_dir() {
        let config = AnswerBookConfig::default().with_data_dir("/var/lib/answerbook");
        assert_eq!(
            config.store_path(Category::Binary),
            PathBuf::from("/var/lib/answerbook/binary_response.json")
        );
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = AnswerBookConfig::default();
        config.matcher.reuse_threshold = 0.2;
        assert!(matches!(
            config.validate(),
            Err(AnswerError::Configuration(_))
        ));
    }

    #[test]
    fn test_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = AnswerBookConfig::default().with_data_dir(dir.path());
        config.write_to(&path).unwrap();
        assert_eq!(AnswerBookConfig::from_file(&path).unwrap(), config);
    }
}
