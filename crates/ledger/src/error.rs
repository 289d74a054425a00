use index::IndexError;
use thiserror::Error;

/// Errors produced by the ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A persisted entry or snapshot could not be decoded. Fatal to a
    /// classification run; recover with an explicit rebuild.
    #[error("ledger entry {key:?} is corrupted: {reason}")]
    Corrupted { key: String, reason: String },
    /// Persisting or loading ledger state failed.
    #[error("ledger store error: {0}")]
    Store(IndexError),
    /// Appending to the group store failed; the ledger was left unchanged.
    #[error("group append failed: {0}")]
    Append(IndexError),
    #[error("key {0} is not registered as interesting")]
    NotInterested(String),
    #[error("snapshot i/o failed: {0}")]
    Snapshot(String),
    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    pub(crate) fn corrupted(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Corrupted {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the underlying cause is an unreachable store, which is worth
    /// retrying once the store comes back.
    pub fn is_store_unavailable(&self) -> bool {
        match self {
            Self::Store(err) | Self::Append(err) => err.is_unavailable(),
            _ => false,
        }
    }
}

impl From<IndexError> for LedgerError {
    fn from(value: IndexError) -> Self {
        LedgerError::Store(value)
    }
}
