use std::time::Duration;

use canonical::Word;
use index::IndexError;
use ledger::LedgerError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How group members are ordered in a lookup result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayOrder {
    /// By each word's second letter, ties broken alphabetically. One-letter
    /// words come first.
    #[default]
    SecondLetter,
    Alphabetical,
    /// As appended by the classifier.
    Insertion,
}

impl DisplayOrder {
    pub fn sort(self, words: &mut [Word]) {
        match self {
            DisplayOrder::SecondLetter => {
                words.sort_by(|a, b| {
                    a.second_letter()
                        .cmp(&b.second_letter())
                        .then_with(|| a.cmp(b))
                })
            }
            DisplayOrder::Alphabetical => words.sort(),
            DisplayOrder::Insertion => {}
        }
    }
}

/// Query-time knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Keep the queried word itself in the result.
    pub include_query_word: bool,
    pub order: DisplayOrder,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            include_query_word: true,
            order: DisplayOrder::SecondLetter,
        }
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "anagrams", rename_all = "snake_case")]
pub enum Lookup {
    Found(Vec<String>),
    /// The word is not part of the target dictionary.
    NotFound,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Members of a found group, empty otherwise.
    pub fn words(&self) -> &[String] {
        match self {
            Lookup::Found(words) => words,
            Lookup::NotFound => &[],
        }
    }
}

/// Lookup failures. A word that simply has no group is [`Lookup::NotFound`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid query word {word:?}: {reason}")]
    InvalidInput { word: String, reason: String },
    /// The store could not be read. Never reported as `NotFound`.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// Stored group data could not be decoded.
    #[error("corrupted group data: {0}")]
    Corrupted(String),
    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<IndexError> for QueryError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Decode(detail) => QueryError::Corrupted(detail),
            other => QueryError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<LedgerError> for QueryError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Store(inner) | LedgerError::Append(inner) => inner.into(),
            other => QueryError::Ledger(other),
        }
    }
}

/// Coarse outcome handed to [`QueryMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Found { members: usize },
    NotFound,
    InvalidInput,
    Failed,
}

/// Observer for lookup latency and outcome.
pub trait QueryMetrics: Send + Sync {
    fn record_lookup(&self, latency: Duration, outcome: LookupOutcome);
}
