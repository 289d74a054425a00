//! # Anagram Index
//!
//! Backend-agnostic storage for anagram groups. A group is an ordered,
//! append-only list of member words keyed by their [`CanonicalKey`].
//!
//! ## Core Features
//!
//! - **Pluggable Backends**: every store goes through the [`StoreBackend`]
//!   trait. Out of the box:
//!   - An in-memory backend for tests and ephemeral runs.
//!   - A Redb backend for durable on-disk storage (`backend-redb`, default).
//! - **List semantics**: [`GroupStore::append`], [`GroupStore::get_all`] and
//!   [`GroupStore::exists`] map onto native ordered lists in the backend.
//! - **Shared handle**: the backend sits behind an `Arc`, so the ledger can
//!   persist its entries in the same database as the groups.
//!
//! ## Example Usage
//!
//! ```
//! use canonical::{canonicalize_str, CanonicalizeConfig};
//! use index::{BackendConfig, GroupStore};
//!
//! let store = GroupStore::new(&BackendConfig::in_memory()).unwrap();
//! let cfg = CanonicalizeConfig::default();
//!
//! for raw in ["tea", "eat"] {
//!     let (word, key) = canonicalize_str(raw, &cfg).unwrap();
//!     store.append(&key, &word).unwrap();
//! }
//!
//! let (_, key) = canonicalize_str("ate", &cfg).unwrap();
//! let members = store.get_all(&key).unwrap();
//! assert_eq!(members.len(), 2);
//! ```

mod backend;

#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use backend::{BackendConfig, InMemoryBackend, StoreBackend};

use canonical::{CanonicalKey, Word};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by storage backends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The backing store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl IndexError {
    pub fn unavailable<E: std::fmt::Display>(err: E) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn encode<E: std::fmt::Display>(err: E) -> Self {
        Self::Encode(err.to_string())
    }

    pub fn decode<E: std::fmt::Display>(err: E) -> Self {
        Self::Decode(err.to_string())
    }

    /// Transient errors worth retrying at the batch level.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Persisted mapping from canonical key to the ordered members of its group.
#[derive(Clone)]
pub struct GroupStore {
    backend: Arc<dyn StoreBackend>,
}

impl GroupStore {
    /// Build the configured backend and wrap it.
    pub fn new(cfg: &BackendConfig) -> Result<Self, IndexError> {
        Ok(Self::with_backend(Arc::from(cfg.build()?)))
    }

    /// Wrap an existing backend (e.g. a shared or instrumented one in tests).
    pub fn with_backend(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    /// Shared handle to the underlying backend.
    pub fn backend(&self) -> Arc<dyn StoreBackend> {
        Arc::clone(&self.backend)
    }

    /// Append `word` to the group of `key`, returning the new group size.
    ///
    /// The store does not deduplicate; callers go through the ledger first.
    pub fn append(&self, key: &CanonicalKey, word: &Word) -> Result<usize, IndexError> {
        let len = self.backend.append(key.as_str(), word.as_str().as_bytes())?;
        tracing::trace!(key = %key, word = %word, len, "group_append");
        Ok(len)
    }

    /// All members of the group in insertion order. Empty if the group is absent.
    pub fn get_all(&self, key: &CanonicalKey) -> Result<Vec<Word>, IndexError> {
        self.backend
            .list(key.as_str())?
            .into_iter()
            .map(|bytes| {
                let text = String::from_utf8(bytes).map_err(IndexError::decode)?;
                Word::parse(&text).map_err(IndexError::decode)
            })
            .collect()
    }

    pub fn exists(&self, key: &CanonicalKey) -> Result<bool, IndexError> {
        self.backend.exists(key.as_str())
    }

    /// Flush backend buffers if supported.
    pub fn flush(&self) -> Result<(), IndexError> {
        self.backend.flush()
    }
}
