use thiserror::Error;

/// Errors that can occur while canonicalizing a word.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid word {word:?}: {reason}")]
    InvalidInput { word: String, reason: &'static str },
    #[error("prime-product key for {word:?} exceeds 128 bits")]
    KeyOverflow { word: String },
}

impl CanonicalError {
    pub(crate) fn invalid(word: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidInput {
            word: word.into(),
            reason,
        }
    }

    /// True for errors caused by the word itself rather than the configuration.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::KeyOverflow { .. })
    }
}
