//! Configuration types for anagram key derivation.
//!
//! [`CanonicalizeConfig`] selects the key strategy and the namespace that
//! prefixes every key written to a shared store.
//!
//! # Versioning
//!
//! Any change to how keys are derived must bump `version`. Keys produced by
//! different versions are not comparable, and a store populated under one
//! version must be rebuilt before it is queried under another.
//!
//! # Examples
//!
//! ```rust
//! use canonical::{CanonicalizeConfig, KeyStrategy};
//!
//! let config = CanonicalizeConfig::default();
//! assert_eq!(config.version, 1);
//! assert_eq!(config.strategy, KeyStrategy::Sorted);
//! assert_eq!(config.namespace, "anagram");
//!
//! let prime = CanonicalizeConfig {
//!     strategy: KeyStrategy::PrimeProduct,
//!     ..Default::default()
//! };
//! assert!(prime.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CanonicalError;

/// Longest word accepted by default. Real dictionaries top out well below this.
pub const DEFAULT_MAX_WORD_LEN: usize = 64;

/// Which permutation-invariant key to derive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// Letters sorted by code point. Never collides; O(n log n) per word.
    #[default]
    Sorted,
    /// Product of one prime per letter. O(n) per word, bounded by `u128`.
    PrimeProduct,
}

impl KeyStrategy {
    /// Tag embedded in every key so the two strategies cannot collide.
    pub fn tag(self) -> &'static str {
        match self {
            KeyStrategy::Sorted => "sorted",
            KeyStrategy::PrimeProduct => "prime",
        }
    }
}

/// Configuration for the canonicalizer.
///
/// # Fields
///
/// - `version`: must be >= 1; version 0 is reserved
/// - `strategy`: sorted-letter or prime-product keys
/// - `namespace`: prefix for keys in a shared store, must not contain `:`
/// - `max_word_len`: words longer than this are rejected as invalid input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalizeConfig {
    pub version: u32,
    #[serde(default)]
    pub strategy: KeyStrategy,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_max_word_len")]
    pub max_word_len: usize,
}

impl CanonicalizeConfig {
    pub fn with_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn validate(&self) -> Result<(), CanonicalError> {
        if self.version == 0 {
            return Err(CanonicalError::InvalidConfig(
                "config version must be >= 1".into(),
            ));
        }
        if self.namespace.trim().is_empty() {
            return Err(CanonicalError::InvalidConfig(
                "namespace must not be empty".into(),
            ));
        }
        if self.namespace.contains(':') {
            return Err(CanonicalError::InvalidConfig(
                "namespace must not contain ':'".into(),
            ));
        }
        if self.max_word_len == 0 {
            return Err(CanonicalError::InvalidConfig(
                "max_word_len must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CanonicalizeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            strategy: KeyStrategy::default(),
            namespace: default_namespace(),
            max_word_len: DEFAULT_MAX_WORD_LEN,
        }
    }
}

fn default_namespace() -> String {
    "anagram".to_string()
}

fn default_max_word_len() -> usize {
    DEFAULT_MAX_WORD_LEN
}
