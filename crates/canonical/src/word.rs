use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CanonicalError;

/// A lowercased, purely ASCII-alphabetic word.
///
/// The only way to obtain one is [`Word::parse`], so every `Word` in the
/// pipeline has already passed validation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Word(String);

impl Word {
    /// Trim, lowercase and validate raw input.
    pub fn parse(raw: &str) -> Result<Self, CanonicalError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CanonicalError::invalid(raw, "empty word"));
        }
        if !trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(CanonicalError::invalid(raw, "non-alphabetic characters"));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Second letter, used for display ordering. `None` for one-letter words.
    pub fn second_letter(&self) -> Option<u8> {
        self.0.as_bytes().get(1).copied()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Word {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Word {
    type Error = CanonicalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Word::parse(&value)
    }
}

impl From<Word> for String {
    fn from(value: Word) -> Self {
        value.0
    }
}
