//! YAML configuration for the anagram pipeline.
//!
//! Every stage reads its section of one file. Missing sections fall back to
//! their defaults, so an empty document with just a version is valid.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "english dictionary"
//!
//! canonical:
//!   version: 1
//!   strategy: "sorted"        # or "prime_product"
//!   namespace: "anagram"
//!   max_word_len: 64
//!
//! store:
//!   backend: "redb"
//!   path: "/var/lib/anagram/groups.redb"
//!
//! classifier:
//!   workers: 8
//!   max_retries: 3
//!   base_delay_ms: 200
//!   max_delay_ms: 10000
//!   jitter: true
//!   prefix_cache: 0
//!
//! query:
//!   include_query_word: true
//!   order: "second_letter"    # or "alphabetical", "insertion"
//! ```

use std::fs;
use std::path::Path;

use canonical::CanonicalizeConfig;
use classifier::ClassifierConfig;
use index::BackendConfig;
use query::QueryConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnagramConfig {
    /// Configuration format version.
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub canonical: CanonicalYamlConfig,

    /// Shared by the groups and the ledger.
    #[serde(default)]
    pub store: BackendConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

impl AnagramConfig {
    /// Load a YAML configuration file from the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML configuration from a string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: AnagramConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.canonical.validate()?;
        if let BackendConfig::Redb { path } = &self.store {
            if path.trim().is_empty() {
                return Err(ConfigLoadError::Validation(
                    "store.path must not be empty for the redb backend".into(),
                ));
            }
        }
        self.classifier
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        Ok(())
    }
}

impl Default for AnagramConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            canonical: CanonicalYamlConfig::default(),
            store: BackendConfig::default(),
            classifier: ClassifierConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

/// Canonicalization section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_strategy")]
    pub strategy: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_max_word_len")]
    pub max_word_len: usize,
}

impl CanonicalYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        self.to_config()?
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))
    }

    /// Convert to the canonical crate's config.
    pub fn to_config(&self) -> Result<CanonicalizeConfig, ConfigLoadError> {
        let strategy = match self.strategy.as_str() {
            "sorted" => canonical::KeyStrategy::Sorted,
            "prime_product" | "prime" => canonical::KeyStrategy::PrimeProduct,
            other => {
                return Err(ConfigLoadError::Validation(format!(
                    "canonical.strategy must be \"sorted\" or \"prime_product\", got {other:?}"
                )))
            }
        };
        Ok(CanonicalizeConfig {
            version: self.version,
            strategy,
            namespace: self.namespace.clone(),
            max_word_len: self.max_word_len,
        })
    }
}

impl Default for CanonicalYamlConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            strategy: default_strategy(),
            namespace: default_namespace(),
            max_word_len: default_max_word_len(),
        }
    }
}

// Helper functions for serde defaults
fn default_version() -> u32 {
    1
}
fn default_strategy() -> String {
    "sorted".to_string()
}
fn default_namespace() -> String {
    "anagram".to_string()
}
fn default_max_word_len() -> usize {
    canonical::DEFAULT_MAX_WORD_LEN
}
