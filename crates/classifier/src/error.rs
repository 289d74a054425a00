use canonical::CanonicalError;
use index::IndexError;
use ledger::LedgerError;
use thiserror::Error;

/// Errors that abort a classification run.
///
/// Per-word problems (invalid words, a failed append for one candidate) are
/// not errors; they are counted in the [`ClassifyReport`](crate::ClassifyReport).
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The ledger could not be loaded, persisted or is corrupted.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("group store error: {0}")]
    Store(#[from] IndexError),
    #[error("failed to read word list: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid classifier configuration: {0}")]
    Config(String),
    #[error("invalid canonicalizer configuration: {0}")]
    Canonical(#[from] CanonicalError),
    #[error("a classification run is already in progress")]
    Busy,
}

impl ClassifyError {
    /// Whether repeating the run may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_unavailable(),
            Self::Ledger(err) => err.is_store_unavailable(),
            _ => false,
        }
    }
}
