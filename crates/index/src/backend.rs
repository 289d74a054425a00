use crate::IndexError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

/// Trait for a storage backend with plain values and ordered lists.
///
/// Values and lists live in separate key spaces. Lists are append-only and
/// keep insertion order. Implementations must be safe to share across
/// threads; a single `append` is atomic.
pub trait StoreBackend: Send + Sync {
    /// Retrieve a value by key.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError>;
    /// Insert or replace a value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError>;
    /// Delete a value. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), IndexError>;
    /// Visit every value whose key starts with `prefix`, in key order.
    fn scan_prefix(
        &self,
        prefix: &str,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError>;
    /// Append an item to the list at `key`, returning the new list length.
    fn append(&self, key: &str, item: &[u8]) -> Result<usize, IndexError>;
    /// All items of the list at `key` in insertion order. Empty if absent.
    fn list(&self, key: &str) -> Result<Vec<Vec<u8>>, IndexError>;
    /// Whether a non-empty list exists at `key`.
    fn exists(&self, key: &str) -> Result<bool, IndexError>;
    /// Flush any buffered writes to the backend.
    fn flush(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

/// Configuration for selecting and building a backend.
///
/// # Example
/// ```
/// use index::BackendConfig;
///
/// // In-memory (for testing)
/// let config = BackendConfig::in_memory();
///
/// // Redb (durable, pure Rust)
/// let config = BackendConfig::redb("/data/anagrams.redb");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Use Redb for storage. The `path` is the file path for the database.
    ///
    /// Requires the `backend-redb` feature (enabled by default).
    Redb { path: String },
    /// Keep everything in process memory. Lost on exit.
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    /// Whether data written through this backend survives a restart.
    pub fn is_durable(&self) -> bool {
        matches!(self, BackendConfig::Redb { .. })
    }

    /// Build the backend based on the configuration.
    pub fn build(&self) -> Result<Box<dyn StoreBackend>, IndexError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Box::new(RedbBackend::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(IndexError::unavailable(
                        "redb backend disabled at compile time",
                    ))
                }
            }
        }
    }
}

/// An in-memory backend using `RwLock`ed maps.
pub struct InMemoryBackend {
    values: RwLock<BTreeMap<String, Vec<u8>>>,
    lists: RwLock<hashbrown::HashMap<String, Vec<Vec<u8>>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
            lists: RwLock::new(hashbrown::HashMap::new()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> IndexError {
    IndexError::unavailable("poisoned lock")
}

impl StoreBackend for InMemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let guard = self.values.read().map_err(poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        self.values
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), IndexError> {
        self.values.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &str,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        // The read lock is held for the duration of the scan.
        let guard = self.values.read().map_err(poisoned)?;
        for (key, value) in guard.range::<str, _>((Bound::Included(prefix), Bound::Unbounded)) {
            if !key.starts_with(prefix) {
                break;
            }
            visitor(key, value)?;
        }
        Ok(())
    }

    fn append(&self, key: &str, item: &[u8]) -> Result<usize, IndexError> {
        let mut guard = self.lists.write().map_err(poisoned)?;
        let list = guard.entry(key.to_string()).or_default();
        list.push(item.to_vec());
        Ok(list.len())
    }

    fn list(&self, key: &str) -> Result<Vec<Vec<u8>>, IndexError> {
        let guard = self.lists.read().map_err(poisoned)?;
        Ok(guard.get(key).cloned().unwrap_or_default())
    }

    fn exists(&self, key: &str) -> Result<bool, IndexError> {
        let guard = self.lists.read().map_err(poisoned)?;
        Ok(guard.get(key).is_some_and(|list| !list.is_empty()))
    }
}

#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use self::redb::RedbBackend;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_values_roundtrip() {
        let backend = InMemoryBackend::new();
        backend.put("k1", b"v1").unwrap();
        assert_eq!(backend.get("k1").unwrap(), Some(b"v1".to_vec()));
        backend.delete("k1").unwrap();
        assert_eq!(backend.get("k1").unwrap(), None);
        backend.delete("k1").unwrap();
    }

    #[test]
    fn in_memory_lists_keep_order() {
        let backend = InMemoryBackend::new();
        assert!(!backend.exists("g").unwrap());
        assert_eq!(backend.append("g", b"tea").unwrap(), 1);
        assert_eq!(backend.append("g", b"eat").unwrap(), 2);
        assert!(backend.exists("g").unwrap());
        assert_eq!(
            backend.list("g").unwrap(),
            vec![b"tea".to_vec(), b"eat".to_vec()]
        );
        assert!(backend.list("missing").unwrap().is_empty());
    }

    #[test]
    fn in_memory_scan_prefix_is_bounded() {
        let backend = InMemoryBackend::new();
        backend.put("ledger:a", b"1").unwrap();
        backend.put("ledger:b", b"2").unwrap();
        backend.put("ledgers", b"x").unwrap();
        backend.put("other", b"y").unwrap();

        let mut seen = Vec::new();
        backend
            .scan_prefix("ledger:", &mut |key, value| {
                seen.push((key.to_string(), value.to_vec()));
                Ok(())
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![
                ("ledger:a".to_string(), b"1".to_vec()),
                ("ledger:b".to_string(), b"2".to_vec()),
            ]
        );
    }

    #[test]
    fn values_and_lists_are_separate_key_spaces() {
        let backend = InMemoryBackend::new();
        backend.put("k", b"value").unwrap();
        assert!(!backend.exists("k").unwrap());
        backend.append("k", b"item").unwrap();
        assert_eq!(backend.get("k").unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn config_builds_in_memory() {
        let backend = BackendConfig::in_memory().build().unwrap();
        backend.append("x", b"y").unwrap();
        assert!(backend.exists("x").unwrap());
        assert!(!BackendConfig::in_memory().is_durable());
        assert!(BackendConfig::redb("/tmp/x.redb").is_durable());
    }
}
