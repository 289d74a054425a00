use std::collections::BTreeSet;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use canonical::{CanonicalKey, Word};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Bump this value whenever the stored `KeyEntry` layout changes.
pub const LEDGER_SCHEMA_VERSION: u16 = 1;

/// Prefix of every ledger value in the shared store.
pub const LEDGER_PREFIX: &str = "ledger:";

/// Ledger state for one canonical key of interest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    /// Target-dictionary words that registered this key.
    pub targets: BTreeSet<Word>,
    /// Words already appended to the group.
    pub seen: BTreeSet<Word>,
    /// Words whose append was started but not yet confirmed.
    pub pending: BTreeSet<Word>,
}

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    schema_version: u16,
    entry: KeyEntry,
}

pub(crate) fn storage_key(key: &CanonicalKey) -> String {
    format!("{LEDGER_PREFIX}{key}")
}

pub(crate) fn encode_entry(key: &CanonicalKey, entry: &KeyEntry) -> Result<Vec<u8>, LedgerError> {
    let stored = StoredEntry {
        schema_version: LEDGER_SCHEMA_VERSION,
        entry: entry.clone(),
    };
    encode_to_vec(&stored, standard())
        .map_err(|e| LedgerError::Store(index::IndexError::encode(format!("{key}: {e}"))))
}

pub(crate) fn decode_entry(storage_key: &str, bytes: &[u8]) -> Result<KeyEntry, LedgerError> {
    let (stored, read): (StoredEntry, usize) =
        decode_from_slice(bytes, standard()).map_err(|e| LedgerError::corrupted(storage_key, e))?;
    if read != bytes.len() {
        return Err(LedgerError::corrupted(
            storage_key,
            format!("{} trailing bytes", bytes.len() - read),
        ));
    }
    if stored.schema_version != LEDGER_SCHEMA_VERSION {
        return Err(LedgerError::corrupted(
            storage_key,
            format!("unsupported schema version {}", stored.schema_version),
        ));
    }
    Ok(stored.entry)
}
