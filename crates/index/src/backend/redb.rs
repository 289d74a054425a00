//! Redb (Rust embedded database) backend for anagram group storage.
//!
//! Two tables share one database file:
//!
//! - `anagram_values`: `&str -> &[u8]`, used for ledger entries
//! - `anagram_lists`: `(&str, u64) -> &[u8]`, one row per list item keyed by
//!   list name and sequence number, so a range scan over one name yields the
//!   list in insertion order
//!
//! Every write is its own ACID transaction. Redb serializes writers and
//! serves readers from MVCC snapshots, so the backend is safe to share
//! across classification workers and query threads.
//!
//! # Configuration Example
//! ```yaml
//! store:
//!   backend: "redb"
//!   path: "/data/anagrams.redb"
//! ```

use crate::{IndexError, StoreBackend};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

const VALUES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("anagram_values");
const LISTS_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("anagram_lists");

/// Redb backend implementation for persistent storage.
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Open or create a Redb database at the given path.
    ///
    /// # Example
    /// ```no_run
    /// use index::RedbBackend;
    ///
    /// let backend = RedbBackend::open("/tmp/anagrams.redb").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let db = Database::create(path).map_err(IndexError::unavailable)?;

        // Accessing the tables creates them, so later read transactions can
        // open them unconditionally.
        let write_txn = db.begin_write().map_err(IndexError::unavailable)?;
        {
            write_txn
                .open_table(VALUES_TABLE)
                .map_err(IndexError::unavailable)?;
            write_txn
                .open_table(LISTS_TABLE)
                .map_err(IndexError::unavailable)?;
        }
        write_txn.commit().map_err(IndexError::unavailable)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl StoreBackend for RedbBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let read_txn = self.db.begin_read().map_err(IndexError::unavailable)?;
        let table = read_txn
            .open_table(VALUES_TABLE)
            .map_err(IndexError::unavailable)?;

        match table.get(key).map_err(IndexError::unavailable)? {
            Some(value) => Ok(Some(value.value().to_vec())),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write().map_err(IndexError::unavailable)?;
        {
            let mut table = write_txn
                .open_table(VALUES_TABLE)
                .map_err(IndexError::unavailable)?;
            table.insert(key, value).map_err(IndexError::unavailable)?;
        }
        write_txn.commit().map_err(IndexError::unavailable)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write().map_err(IndexError::unavailable)?;
        {
            let mut table = write_txn
                .open_table(VALUES_TABLE)
                .map_err(IndexError::unavailable)?;
            table.remove(key).map_err(IndexError::unavailable)?;
        }
        write_txn.commit().map_err(IndexError::unavailable)?;
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &str,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        let read_txn = self.db.begin_read().map_err(IndexError::unavailable)?;
        let table = read_txn
            .open_table(VALUES_TABLE)
            .map_err(IndexError::unavailable)?;

        for item in table.range(prefix..).map_err(IndexError::unavailable)? {
            let (key, value) = item.map_err(IndexError::unavailable)?;
            if !key.value().starts_with(prefix) {
                break;
            }
            visitor(key.value(), value.value())?;
        }
        Ok(())
    }

    fn append(&self, key: &str, item: &[u8]) -> Result<usize, IndexError> {
        let write_txn = self.db.begin_write().map_err(IndexError::unavailable)?;
        let len = {
            let mut table = write_txn
                .open_table(LISTS_TABLE)
                .map_err(IndexError::unavailable)?;
            // Read the tail and insert inside one write transaction, so
            // concurrent appends to the same list cannot reuse a sequence.
            let next = {
                let mut items = table
                    .range((key, 0u64)..=(key, u64::MAX))
                    .map_err(IndexError::unavailable)?;
                match items.next_back() {
                    Some(last) => {
                        let (last_key, _) = last.map_err(IndexError::unavailable)?;
                        last_key.value().1 + 1
                    }
                    None => 0,
                }
            };
            table
                .insert((key, next), item)
                .map_err(IndexError::unavailable)?;
            next as usize + 1
        };
        write_txn.commit().map_err(IndexError::unavailable)?;
        Ok(len)
    }

    fn list(&self, key: &str) -> Result<Vec<Vec<u8>>, IndexError> {
        let read_txn = self.db.begin_read().map_err(IndexError::unavailable)?;
        let table = read_txn
            .open_table(LISTS_TABLE)
            .map_err(IndexError::unavailable)?;

        let mut out = Vec::new();
        for item in table
            .range((key, 0u64)..=(key, u64::MAX))
            .map_err(IndexError::unavailable)?
        {
            let (_, value) = item.map_err(IndexError::unavailable)?;
            out.push(value.value().to_vec());
        }
        Ok(out)
    }

    fn exists(&self, key: &str) -> Result<bool, IndexError> {
        let read_txn = self.db.begin_read().map_err(IndexError::unavailable)?;
        let table = read_txn
            .open_table(LISTS_TABLE)
            .map_err(IndexError::unavailable)?;
        let mut items = table
            .range((key, 0u64)..=(key, u64::MAX))
            .map_err(IndexError::unavailable)?;
        Ok(items.next().is_some())
    }

    fn flush(&self) -> Result<(), IndexError> {
        // Commits are durable on return.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_backend(dir: &TempDir) -> RedbBackend {
        RedbBackend::open(dir.path().join("store.redb")).unwrap()
    }

    #[test]
    fn test_redb_values_roundtrip() {
        let dir = TempDir::new().unwrap();
        let backend = open_backend(&dir);

        backend.put("key1", b"value1").unwrap();
        assert_eq!(backend.get("key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(backend.get("nonexistent").unwrap(), None);

        backend.delete("key1").unwrap();
        assert_eq!(backend.get("key1").unwrap(), None);
    }

    #[test]
    fn test_redb_lists_keep_insertion_order() {
        let dir = TempDir::new().unwrap();
        let backend = open_backend(&dir);

        assert!(!backend.exists("anagram:sorted:aet").unwrap());
        assert_eq!(backend.append("anagram:sorted:aet", b"tea").unwrap(), 1);
        assert_eq!(backend.append("anagram:sorted:aet", b"eat").unwrap(), 2);
        assert_eq!(backend.append("anagram:sorted:aet", b"ate").unwrap(), 3);
        backend.append("anagram:sorted:dgo", b"dog").unwrap();

        assert!(backend.exists("anagram:sorted:aet").unwrap());
        assert_eq!(
            backend.list("anagram:sorted:aet").unwrap(),
            vec![b"tea".to_vec(), b"eat".to_vec(), b"ate".to_vec()]
        );
        assert_eq!(
            backend.list("anagram:sorted:dgo").unwrap(),
            vec![b"dog".to_vec()]
        );
    }

    #[test]
    fn test_redb_list_names_do_not_bleed_into_each_other() {
        let dir = TempDir::new().unwrap();
        let backend = open_backend(&dir);

        backend.append("ab", b"1").unwrap();
        backend.append("abc", b"2").unwrap();
        assert_eq!(backend.list("ab").unwrap(), vec![b"1".to_vec()]);
        assert_eq!(backend.list("abc").unwrap(), vec![b"2".to_vec()]);
    }

    #[test]
    fn test_redb_scan_prefix() {
        let dir = TempDir::new().unwrap();
        let backend = open_backend(&dir);

        backend.put("ledger:a", b"1").unwrap();
        backend.put("ledger:b", b"2").unwrap();
        backend.put("zzz", b"3").unwrap();

        let mut keys = Vec::new();
        backend
            .scan_prefix("ledger:", &mut |key, _| {
                keys.push(key.to_string());
                Ok(())
            })
            .unwrap();
        assert_eq!(keys, vec!["ledger:a", "ledger:b"]);
    }

    #[test]
    fn test_redb_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let backend = open_backend(&dir);
            backend.append("group", b"tea").unwrap();
            backend.put("ledger:group", b"entry").unwrap();
        }
        let backend = open_backend(&dir);
        assert_eq!(backend.list("group").unwrap(), vec![b"tea".to_vec()]);
        assert_eq!(backend.get("ledger:group").unwrap(), Some(b"entry".to_vec()));
        assert_eq!(backend.append("group", b"eat").unwrap(), 2);
    }
}
