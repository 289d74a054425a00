//! Portable ledger snapshots.
//!
//! A snapshot is the whole ledger as one bincode document compressed with
//! zstd. Export writes to a temp file next to the target and renames it into
//! place, so a crash never leaves a truncated snapshot behind.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use canonical::CanonicalKey;
use index::StoreBackend;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;
use zstd::{decode_all, encode_all};

use crate::entry::{KeyEntry, LEDGER_SCHEMA_VERSION};
use crate::{lock, replace_entries, Ledger, LedgerError};

const SNAPSHOT_ZSTD_LEVEL: i32 = 3;

/// Every ledger entry, keyed by canonical key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub schema_version: u16,
    pub entries: BTreeMap<CanonicalKey, KeyEntry>,
}

impl LedgerSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        let raw = encode_to_vec(self, standard()).map_err(snapshot_err)?;
        encode_all(raw.as_slice(), SNAPSHOT_ZSTD_LEVEL).map_err(snapshot_err)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        let raw = decode_all(bytes).map_err(|e| LedgerError::corrupted("snapshot", e))?;
        let (snapshot, _): (LedgerSnapshot, usize) = decode_from_slice(&raw, standard())
            .map_err(|e| LedgerError::corrupted("snapshot", e))?;
        if snapshot.schema_version != LEDGER_SCHEMA_VERSION {
            return Err(LedgerError::corrupted(
                "snapshot",
                format!("unsupported schema version {}", snapshot.schema_version),
            ));
        }
        Ok(snapshot)
    }
}

impl Ledger {
    /// Copy the current in-memory state into a snapshot.
    pub fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        let mut entries = BTreeMap::new();
        for item in self.entries.iter() {
            let entry = lock(item.value())?;
            entries.insert(item.key().clone(), entry.clone());
        }
        Ok(LedgerSnapshot {
            schema_version: LEDGER_SCHEMA_VERSION,
            entries,
        })
    }

    /// Write a snapshot to `path` atomically.
    pub fn export_snapshot(&self, path: &Path) -> Result<LedgerSnapshot, LedgerError> {
        let snapshot = self.snapshot()?;
        let bytes = snapshot.to_bytes()?;

        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(snapshot_err)?;

        let mut temp = NamedTempFile::new_in(parent).map_err(snapshot_err)?;
        temp.write_all(&bytes).map_err(snapshot_err)?;
        temp.as_file().sync_all().map_err(snapshot_err)?;
        temp.persist(path).map_err(|e| snapshot_err(e.error))?;

        info!(
            path = %path.display(),
            keys = snapshot.entries.len(),
            bytes = bytes.len(),
            "ledger_snapshot_exported"
        );
        Ok(snapshot)
    }

    /// Replace every ledger entry in `backend` with the contents of the
    /// snapshot at `path`, then open the restored ledger.
    pub fn import_snapshot(
        backend: Arc<dyn StoreBackend>,
        path: &Path,
    ) -> Result<Self, LedgerError> {
        let bytes = fs::read(path).map_err(snapshot_err)?;
        let snapshot = LedgerSnapshot::from_bytes(&bytes)?;

        replace_entries(backend.as_ref(), &snapshot.entries)?;
        info!(
            path = %path.display(),
            keys = snapshot.entries.len(),
            "ledger_snapshot_imported"
        );
        Self::open(backend)
    }
}

fn snapshot_err<E: std::fmt::Display>(err: E) -> LedgerError {
    LedgerError::Snapshot(err.to_string())
}
