//! # Anagram Classifier
//!
//! Two-pass, incremental grouping of a candidate word list against a target
//! dictionary.
//!
//! 1. **Register interest**: every target word registers its canonical key
//!    with the ledger and is recorded as a member of its own group.
//! 2. **Scan**: every candidate whose key was registered by this run's
//!    targets is appended to the group unless the ledger has already
//!    recorded it. Candidates with any other key are dropped without
//!    touching storage, even if an earlier run registered that key.
//!
//! Re-running with the same lists appends nothing; a run with new
//! candidates appends only those. Before either pass the classifier resolves
//! any pending marks an interrupted run left behind.
//!
//! ```
//! use std::sync::Arc;
//! use canonical::{Canonicalizer, CanonicalizeConfig};
//! use classifier::{Classifier, ClassifierConfig};
//! use index::{BackendConfig, GroupStore};
//! use ledger::Ledger;
//!
//! let store = GroupStore::new(&BackendConfig::in_memory()).unwrap();
//! let ledger = Arc::new(Ledger::open(store.backend()).unwrap());
//! let canonicalizer = Canonicalizer::new(CanonicalizeConfig::default()).unwrap();
//! let classifier =
//!     Classifier::new(canonicalizer, ledger, store, ClassifierConfig::default()).unwrap();
//!
//! let targets = vec!["tea".to_string()];
//! let candidates = vec!["eat".to_string(), "dog".to_string()];
//! let report = classifier.run(&targets, &candidates).unwrap();
//! assert_eq!(report.appended, 2);
//! assert_eq!(report.skipped_uninterested, 1);
//! ```

mod config;
mod error;
mod report;
mod retry;
mod wordlist;

pub use crate::config::ClassifierConfig;
pub use crate::error::ClassifyError;
pub use crate::report::ClassifyReport;
pub use crate::retry::{retry, Retried, RetryPolicy};
pub use crate::wordlist::{read_words, read_words_from_path};

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use canonical::{CanonicalKey, Canonicalizer, Word};
use index::{GroupStore, StoreBackend};
use ledger::{Ledger, LedgerError, RecordOutcome};
use rayon::prelude::*;
use tracing::{debug, info, trace, warn, Level};

use crate::report::{Tally, WordOutcome};

/// Lifecycle of a [`Classifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierState {
    Idle,
    RegisteringInterest,
    Scanning,
    Done,
}

/// Drives classification runs over a shared ledger and group store.
pub struct Classifier {
    canonicalizer: Canonicalizer,
    ledger: Arc<Ledger>,
    store: GroupStore,
    cfg: ClassifierConfig,
    pool: rayon::ThreadPool,
    state: Mutex<ClassifierState>,
}

impl Classifier {
    pub fn new(
        canonicalizer: Canonicalizer,
        ledger: Arc<Ledger>,
        store: GroupStore,
        cfg: ClassifierConfig,
    ) -> Result<Self, ClassifyError> {
        cfg.validate()?;
        let canonicalizer = if cfg.prefix_cache > 0 {
            canonicalizer.with_prefix_cache(cfg.prefix_cache)
        } else {
            canonicalizer
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cfg.workers)
            .thread_name(|i| format!("anagram-scan-{i}"))
            .build()
            .map_err(|e| ClassifyError::Config(e.to_string()))?;

        Ok(Self {
            canonicalizer,
            ledger,
            store,
            cfg,
            pool,
            state: Mutex::new(ClassifierState::Idle),
        })
    }

    pub fn state(&self) -> ClassifierState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn store(&self) -> &GroupStore {
        &self.store
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.cfg
    }

    /// One full pass over both lists.
    ///
    /// Per-word failures are isolated: invalid words and failed appends are
    /// counted in the report and the run continues. Errors returned here
    /// (ledger corruption, an unreachable store during recovery or interest
    /// registration) abort the run.
    pub fn run(
        &self,
        targets: &[String],
        candidates: &[String],
    ) -> Result<ClassifyReport, ClassifyError> {
        self.begin()?;
        let result = self.run_inner(targets, candidates);
        self.set_state(match result {
            Ok(_) => ClassifierState::Done,
            Err(_) => ClassifierState::Idle,
        });
        result
    }

    /// [`run`](Self::run) repeated with exponential backoff while the store
    /// is unavailable or some appends failed.
    pub fn run_with_retry(
        &self,
        targets: &[String],
        candidates: &[String],
    ) -> Result<ClassifyReport, ClassifyError> {
        let policy = self.cfg.retry_policy();
        let out = retry(
            &policy,
            |attempt| {
                if attempt > 0 {
                    info!(attempt, "classify_retry");
                }
                self.run(targets, candidates)
            },
            |result| match result {
                Ok(report) => !report.is_complete(),
                Err(err) => err.is_retryable(),
            },
        );

        match &out.result {
            Ok(report) if !report.is_complete() => warn!(
                attempts = out.attempts,
                failed = report.failed,
                "classify_incomplete_after_retries"
            ),
            Err(err) => warn!(attempts = out.attempts, error = %err, "classify_failed"),
            Ok(_) => {}
        }
        out.result
    }

    /// Read both lists from disk once, then [`run_with_retry`](Self::run_with_retry).
    pub fn run_files(
        &self,
        targets: &Path,
        candidates: &Path,
    ) -> Result<ClassifyReport, ClassifyError> {
        let targets = read_words_from_path(targets)?;
        let candidates = read_words_from_path(candidates)?;
        self.run_with_retry(&targets, &candidates)
    }

    fn run_inner(
        &self,
        targets: &[String],
        candidates: &[String],
    ) -> Result<ClassifyReport, ClassifyError> {
        let start = Instant::now();
        let span = tracing::span!(
            Level::INFO,
            "classifier.run",
            targets = targets.len(),
            candidates = candidates.len()
        );
        let _guard = span.enter();

        let recovery = self.ledger.recover(&self.store)?;

        self.set_state(ClassifierState::RegisteringInterest);
        let mut target_tally = Tally::default();
        let mut interest = HashSet::new();
        for raw in targets {
            target_tally.add(self.register_target(raw, &mut interest)?);
        }

        self.set_state(ClassifierState::Scanning);
        let interest = &interest;
        let scan_tally = self.pool.install(|| {
            candidates
                .par_iter()
                .map(|raw| self.scan_candidate(raw, interest))
                .try_fold(Tally::default, |mut tally, outcome| {
                    tally.add(outcome?);
                    Ok::<_, ClassifyError>(tally)
                })
                .try_reduce(Tally::default, |a, b| Ok(a.merge(b)))
        })?;

        self.store.flush()?;
        self.ledger.flush()?;

        let report = ClassifyReport {
            targets: target_tally.seen_valid,
            candidates: scan_tally.seen_valid,
            invalid: target_tally.invalid + scan_tally.invalid,
            skipped_uninterested: scan_tally.skipped,
            appended: target_tally.appended + scan_tally.appended,
            already_seen: target_tally.already_seen + scan_tally.already_seen,
            failed: target_tally.failed + scan_tally.failed,
            recovered: recovery.confirmed,
            elapsed: start.elapsed(),
        };
        info!(
            targets = report.targets,
            candidates = report.candidates,
            invalid = report.invalid,
            skipped = report.skipped_uninterested,
            appended = report.appended,
            already_seen = report.already_seen,
            failed = report.failed,
            elapsed_micros = report.elapsed.as_micros(),
            "classify_complete"
        );
        Ok(report)
    }

    fn register_target(
        &self,
        raw: &str,
        interest: &mut HashSet<CanonicalKey>,
    ) -> Result<WordOutcome, ClassifyError> {
        let (word, key) = match self.canonicalizer.key_for_raw(raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(word = raw, error = %err, "target_invalid");
                return Ok(WordOutcome::Invalid);
            }
        };
        self.ledger.register_target(&key, &word)?;
        interest.insert(key.clone());
        self.record(&key, &word)
    }

    fn scan_candidate(
        &self,
        raw: &str,
        interest: &HashSet<CanonicalKey>,
    ) -> Result<WordOutcome, ClassifyError> {
        let (word, key) = match self.canonicalizer.key_for_raw(raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(word = raw, error = %err, "candidate_invalid");
                return Ok(WordOutcome::Invalid);
            }
        };
        if !interest.contains(&key) {
            trace!(word = %word, "candidate_uninterested");
            return Ok(WordOutcome::Skipped);
        }
        self.record(&key, &word)
    }

    fn record(&self, key: &CanonicalKey, word: &Word) -> Result<WordOutcome, ClassifyError> {
        match self.ledger.record(key, word, &self.store) {
            Ok(RecordOutcome::Appended { .. }) => Ok(WordOutcome::Appended),
            Ok(RecordOutcome::AlreadySeen) => Ok(WordOutcome::AlreadySeen),
            Err(err @ (LedgerError::Append(_) | LedgerError::Store(_))) => {
                warn!(key = %key, word = %word, error = %err, "record_failed");
                Ok(WordOutcome::Failed)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn begin(&self) -> Result<(), ClassifyError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            ClassifierState::Idle | ClassifierState::Done => {
                *state = ClassifierState::RegisteringInterest;
                Ok(())
            }
            ClassifierState::RegisteringInterest | ClassifierState::Scanning => {
                Err(ClassifyError::Busy)
            }
        }
    }

    fn set_state(&self, next: ClassifierState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

/// Throw away the ledger in `backend` and rebuild it from the target list
/// and the groups already in `store`.
pub fn rebuild_ledger(
    backend: Arc<dyn StoreBackend>,
    store: &GroupStore,
    canonicalizer: &Canonicalizer,
    targets: &[String],
) -> Result<Ledger, ClassifyError> {
    let mut invalid = 0usize;
    let mut parsed = Vec::with_capacity(targets.len());
    for raw in targets {
        match canonicalizer.key_for_raw(raw) {
            Ok((word, key)) => parsed.push((key, word)),
            Err(err) => {
                debug!(word = raw.as_str(), error = %err, "target_invalid");
                invalid += 1;
            }
        }
    }
    let ledger = Ledger::rebuild(backend, store, parsed)?;
    info!(keys = ledger.len(), invalid, "ledger_rebuild_complete");
    Ok(ledger)
}
