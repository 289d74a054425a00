//! # Anagram Ledger
//!
//! Persistent record of which words have already been appended to which
//! anagram group. The ledger is the restart checkpoint of classification:
//! a re-run consults it and only appends members it has never recorded.
//!
//! ## Storage
//!
//! Each key of interest owns one [`KeyEntry`], written through to the
//! [`StoreBackend`] under `ledger:<canonical key>` on every change. Entries
//! are bincode-encoded inside a versioned envelope. [`Ledger::open`] loads
//! every entry and fails with [`LedgerError::Corrupted`] if any of them does
//! not decode; it never falls back to an empty ledger, since that would
//! re-append every member. [`Ledger::rebuild`] is the explicit way out; it
//! writes the new entries before pruning old ones, so an interrupted rebuild
//! never leaves a key of interest without an entry.
//!
//! ## Append protocol
//!
//! [`Ledger::record`] runs under the key's lock:
//!
//! 1. skip if the word is already seen
//! 2. persist the word as pending
//! 3. append it to the group
//! 4. persist it as seen and clear the pending mark
//!
//! A crash between 2 and 4 leaves a durable pending mark; [`Ledger::recover`]
//! checks the group and either confirms or drops it, so members are never
//! duplicated and `seen` is always a subset of the group.
//!
//! ## Concurrency
//!
//! Entries live in a concurrent map of per-key mutexes. Updates to one key
//! are serialized; different keys proceed in parallel.

mod entry;
mod error;
mod snapshot;

pub use crate::entry::{KeyEntry, LEDGER_PREFIX, LEDGER_SCHEMA_VERSION};
pub use crate::error::LedgerError;
pub use crate::snapshot::LedgerSnapshot;

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use canonical::{CanonicalKey, Word};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use index::{GroupStore, StoreBackend};
use tracing::{info, warn};

use crate::entry::{decode_entry, encode_entry, storage_key};

/// Result of [`Ledger::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The word was appended; `group_len` is the group size afterwards.
    Appended { group_len: usize },
    /// The word was already recorded; nothing was written.
    AlreadySeen,
}

/// Counts reported by [`Ledger::recover`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Pending words found in their group and promoted to seen.
    pub confirmed: usize,
    /// Pending words missing from their group and dropped.
    pub discarded: usize,
}

/// Aggregate sizes, mostly for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub keys: usize,
    pub targets: usize,
    pub seen: usize,
    pub pending: usize,
}

type Slot = Arc<Mutex<KeyEntry>>;

fn lock(slot: &Slot) -> Result<MutexGuard<'_, KeyEntry>, LedgerError> {
    slot.lock().map_err(|_| LedgerError::LockPoisoned)
}

/// Durable interest set plus per-key seen-sets.
pub struct Ledger {
    backend: Arc<dyn StoreBackend>,
    entries: DashMap<CanonicalKey, Slot>,
}

impl Ledger {
    /// Load every persisted entry from `backend`.
    pub fn open(backend: Arc<dyn StoreBackend>) -> Result<Self, LedgerError> {
        let mut raw = Vec::new();
        backend.scan_prefix(LEDGER_PREFIX, &mut |key, value| {
            raw.push((key.to_string(), value.to_vec()));
            Ok(())
        })?;

        let entries = DashMap::with_capacity(raw.len());
        for (stored_key, bytes) in raw {
            let entry = decode_entry(&stored_key, &bytes)?;
            let key = CanonicalKey::from_stored(&stored_key[LEDGER_PREFIX.len()..]);
            entries.insert(key, Arc::new(Mutex::new(entry)));
        }

        let ledger = Self { backend, entries };
        let stats = ledger.stats()?;
        info!(
            keys = stats.keys,
            seen = stats.seen,
            pending = stats.pending,
            "ledger_open"
        );
        Ok(ledger)
    }

    /// Discard all ledger state and rebuild it from the target dictionary
    /// and the current group contents.
    ///
    /// This is the explicit recovery path after [`LedgerError::Corrupted`]:
    /// every target registers its key, and each key's seen-set becomes the
    /// set of members already in its group.
    pub fn rebuild<I>(
        backend: Arc<dyn StoreBackend>,
        store: &GroupStore,
        targets: I,
    ) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = (CanonicalKey, Word)>,
    {
        let mut rebuilt: BTreeMap<CanonicalKey, KeyEntry> = BTreeMap::new();
        for (key, word) in targets {
            rebuilt.entry(key).or_default().targets.insert(word);
        }
        for (key, entry) in rebuilt.iter_mut() {
            entry.seen = store
                .get_all(key)
                .map_err(LedgerError::Store)?
                .into_iter()
                .collect();
        }

        replace_entries(backend.as_ref(), &rebuilt)?;
        let ledger = Self {
            backend,
            entries: rebuilt
                .into_iter()
                .map(|(key, entry)| (key, Arc::new(Mutex::new(entry))))
                .collect(),
        };

        let stats = ledger.stats()?;
        info!(keys = stats.keys, seen = stats.seen, "ledger_rebuilt");
        Ok(ledger)
    }

    pub fn is_interested(&self, key: &CanonicalKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Register `key` as worth grouping. Idempotent.
    pub fn register_interest(&self, key: &CanonicalKey) -> Result<(), LedgerError> {
        let slot = match self.entries.entry(key.clone()) {
            Entry::Occupied(_) => return Ok(()),
            Entry::Vacant(vacant) => Arc::clone(vacant.insert(Slot::default()).value()),
        };
        let entry = lock(&slot)?;
        if let Err(err) = self.persist(key, &entry) {
            drop(entry);
            self.entries.remove(key);
            return Err(err);
        }
        Ok(())
    }

    /// Register `key` and remember `word` as one of its dictionary words.
    pub fn register_target(&self, key: &CanonicalKey, word: &Word) -> Result<(), LedgerError> {
        self.register_interest(key)?;
        let slot = self.slot(key)?;
        let mut entry = lock(&slot)?;
        if entry.targets.insert(word.clone()) {
            if let Err(err) = self.persist(key, &entry) {
                entry.targets.remove(word);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Whether `word` itself belongs to the target dictionary.
    pub fn is_target(&self, key: &CanonicalKey, word: &Word) -> Result<bool, LedgerError> {
        match self.entries.get(key) {
            Some(slot) => {
                let entry = lock(slot.value())?;
                Ok(entry.targets.contains(word))
            }
            None => Ok(false),
        }
    }

    pub fn seen(&self, key: &CanonicalKey, word: &Word) -> Result<bool, LedgerError> {
        match self.entries.get(key) {
            Some(slot) => {
                let entry = lock(slot.value())?;
                Ok(entry.seen.contains(word))
            }
            None => Ok(false),
        }
    }

    /// Record `word` as present in the group of `key`. Idempotent.
    pub fn mark_seen(&self, key: &CanonicalKey, word: &Word) -> Result<(), LedgerError> {
        let slot = self.slot(key)?;
        let mut entry = lock(&slot)?;
        if entry.seen.contains(word) {
            return Ok(());
        }
        let was_pending = entry.pending.remove(word);
        entry.seen.insert(word.clone());
        if let Err(err) = self.persist(key, &entry) {
            entry.seen.remove(word);
            if was_pending {
                entry.pending.insert(word.clone());
            }
            return Err(err);
        }
        Ok(())
    }

    /// Append `word` to its group unless the ledger already recorded it.
    ///
    /// The whole check-append-confirm sequence runs under the key's lock, so
    /// concurrent workers never append the same member twice.
    pub fn record(
        &self,
        key: &CanonicalKey,
        word: &Word,
        store: &GroupStore,
    ) -> Result<RecordOutcome, LedgerError> {
        let slot = self.slot(key)?;
        let mut entry = lock(&slot)?;
        if entry.seen.contains(word) {
            return Ok(RecordOutcome::AlreadySeen);
        }

        // A pending mark in memory means an earlier confirm failed to
        // persist after the append may have landed.
        if entry.pending.contains(word) {
            let members = store.get_all(key).map_err(LedgerError::Append)?;
            if members.contains(word) {
                entry.pending.remove(word);
                entry.seen.insert(word.clone());
                self.persist(key, &entry)?;
                return Ok(RecordOutcome::AlreadySeen);
            }
        }

        entry.pending.insert(word.clone());
        if let Err(err) = self.persist(key, &entry) {
            entry.pending.remove(word);
            return Err(err);
        }

        match store.append(key, word) {
            Ok(group_len) => {
                entry.pending.remove(word);
                entry.seen.insert(word.clone());
                if let Err(err) = self.persist(key, &entry) {
                    // The durable pending mark stays; recovery confirms it.
                    entry.seen.remove(word);
                    entry.pending.insert(word.clone());
                    return Err(err);
                }
                Ok(RecordOutcome::Appended { group_len })
            }
            Err(append_err) => {
                entry.pending.remove(word);
                if let Err(err) = self.persist(key, &entry) {
                    entry.pending.insert(word.clone());
                    warn!(key = %key, word = %word, error = %err, "ledger_pending_rollback_failed");
                }
                Err(LedgerError::Append(append_err))
            }
        }
    }

    /// Resolve pending marks left behind by an interrupted run.
    pub fn recover(&self, store: &GroupStore) -> Result<RecoveryReport, LedgerError> {
        let mut report = RecoveryReport::default();
        for item in self.entries.iter() {
            let (key, slot) = (item.key(), item.value());
            let mut entry = lock(slot)?;
            if entry.pending.is_empty() {
                continue;
            }

            let members = store.get_all(key).map_err(LedgerError::Store)?;
            let pending = std::mem::take(&mut entry.pending);
            for word in pending {
                if members.contains(&word) {
                    entry.seen.insert(word);
                    report.confirmed += 1;
                } else {
                    report.discarded += 1;
                }
            }
            self.persist(key, &entry)?;
        }

        if report != RecoveryReport::default() {
            warn!(
                confirmed = report.confirmed,
                discarded = report.discarded,
                "ledger_recovered_pending"
            );
        }
        Ok(report)
    }

    /// Copy of the entry for `key`, if it is of interest.
    pub fn entry(&self, key: &CanonicalKey) -> Result<Option<KeyEntry>, LedgerError> {
        match self.entries.get(key) {
            Some(slot) => {
                let entry = lock(slot.value())?;
                Ok(Some(entry.clone()))
            }
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> Result<LedgerStats, LedgerError> {
        let mut stats = LedgerStats::default();
        for item in self.entries.iter() {
            let entry = lock(item.value())?;
            stats.keys += 1;
            stats.targets += entry.targets.len();
            stats.seen += entry.seen.len();
            stats.pending += entry.pending.len();
        }
        Ok(stats)
    }

    /// Flush the backend so every persisted entry is durable.
    pub fn flush(&self) -> Result<(), LedgerError> {
        self.backend.flush().map_err(LedgerError::Store)
    }

    fn slot(&self, key: &CanonicalKey) -> Result<Slot, LedgerError> {
        self.entries
            .get(key)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or_else(|| LedgerError::NotInterested(key.to_string()))
    }

    fn slot_or_insert(&self, key: &CanonicalKey) -> Slot {
        Arc::clone(self.entries.entry(key.clone()).or_default().value())
    }

    fn persist(&self, key: &CanonicalKey, entry: &KeyEntry) -> Result<(), LedgerError> {
        let bytes = encode_entry(key, entry)?;
        self.backend
            .put(&storage_key(key), &bytes)
            .map_err(LedgerError::Store)
    }
}

/// Read-only access to persisted ledger entries, fetched on every call.
///
/// The query path uses this instead of [`Ledger`] so it observes entries
/// written by a classification run that started after the service did.
#[derive(Clone)]
pub struct LedgerView {
    backend: Arc<dyn StoreBackend>,
}

impl LedgerView {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    pub fn entry(&self, key: &CanonicalKey) -> Result<Option<KeyEntry>, LedgerError> {
        let stored_key = storage_key(key);
        match self.backend.get(&stored_key).map_err(LedgerError::Store)? {
            Some(bytes) => Ok(Some(decode_entry(&stored_key, &bytes)?)),
            None => Ok(None),
        }
    }

    pub fn is_interested(&self, key: &CanonicalKey) -> Result<bool, LedgerError> {
        Ok(self.entry(key)?.is_some())
    }

    pub fn is_target(&self, key: &CanonicalKey, word: &Word) -> Result<bool, LedgerError> {
        Ok(self
            .entry(key)?
            .is_some_and(|entry| entry.targets.contains(word)))
    }
}

/// Write every entry of `replacement`, then delete the other ledger keys.
///
/// Puts overwrite in place, so an interrupted replace leaves each key with
/// either its old entry or its new one, never with no entry at all.
fn replace_entries(
    backend: &dyn StoreBackend,
    replacement: &BTreeMap<CanonicalKey, KeyEntry>,
) -> Result<(), LedgerError> {
    let mut kept = HashSet::with_capacity(replacement.len());
    for (key, entry) in replacement {
        let stored_key = storage_key(key);
        backend.put(&stored_key, &encode_entry(key, entry)?)?;
        kept.insert(stored_key);
    }

    let mut stale = Vec::new();
    backend.scan_prefix(LEDGER_PREFIX, &mut |key, _| {
        if !kept.contains(key) {
            stale.push(key.to_string());
        }
        Ok(())
    })?;
    for key in stale {
        backend.delete(&key)?;
    }
    Ok(())
}
