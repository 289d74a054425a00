//! # Anagram Query (`query`)
//!
//! Read-only lookup over the groups built by the classifier. A query word is
//! canonicalized, checked against the target dictionary recorded in the
//! ledger, and answered with its group sorted for display.
//!
//! The service never writes. It reads ledger entries straight from the
//! store on every call, so a running service sees the results of a
//! classification run that finished after it started.
//!
//! ```
//! use std::sync::Arc;
//! use canonical::{Canonicalizer, CanonicalizeConfig};
//! use index::{BackendConfig, GroupStore};
//! use ledger::Ledger;
//! use query::{Lookup, QueryConfig, QueryService};
//!
//! let store = GroupStore::new(&BackendConfig::in_memory()).unwrap();
//! let ledger = Ledger::open(store.backend()).unwrap();
//! let canonicalizer = Canonicalizer::new(CanonicalizeConfig::default()).unwrap();
//! let (word, key) = canonicalizer.key_for_raw("tea").unwrap();
//! ledger.register_target(&key, &word).unwrap();
//! ledger.record(&key, &word, &store).unwrap();
//!
//! let service = QueryService::new(canonicalizer, store, QueryConfig::default());
//! assert_eq!(service.lookup("tea").unwrap(), Lookup::Found(vec!["tea".into()]));
//! assert_eq!(service.lookup("zzqx").unwrap(), Lookup::NotFound);
//! ```
//!
//! ## Observability
//!
//! Attach a [`QueryMetrics`] implementation with
//! [`QueryService::with_metrics`] to record per-lookup latency and outcome.

mod types;

pub use crate::types::{DisplayOrder, Lookup, LookupOutcome, QueryConfig, QueryError, QueryMetrics};

use std::sync::Arc;
use std::time::Instant;

use canonical::{CanonicalError, Canonicalizer};
use index::GroupStore;
use ledger::LedgerView;
use tracing::{debug, warn};

/// Answers anagram lookups. `Send + Sync`; share it behind an `Arc`.
pub struct QueryService {
    canonicalizer: Canonicalizer,
    store: GroupStore,
    ledger: LedgerView,
    cfg: QueryConfig,
    metrics: Option<Arc<dyn QueryMetrics>>,
}

impl QueryService {
    /// The ledger is read from the same backend as the groups.
    pub fn new(canonicalizer: Canonicalizer, store: GroupStore, cfg: QueryConfig) -> Self {
        let ledger = LedgerView::new(store.backend());
        Self {
            canonicalizer,
            store,
            ledger,
            cfg,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn QueryMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.cfg
    }

    /// All anagrams of `raw` from the candidate list, sorted for display.
    pub fn lookup(&self, raw: &str) -> Result<Lookup, QueryError> {
        let start = Instant::now();
        let result = self.lookup_inner(raw);
        let latency = start.elapsed();

        let outcome = match &result {
            Ok(Lookup::Found(words)) => LookupOutcome::Found {
                members: words.len(),
            },
            Ok(Lookup::NotFound) => LookupOutcome::NotFound,
            Err(QueryError::InvalidInput { .. }) => LookupOutcome::InvalidInput,
            Err(_) => LookupOutcome::Failed,
        };
        match &result {
            Err(
                err @ (QueryError::StoreUnavailable(_)
                | QueryError::Corrupted(_)
                | QueryError::Ledger(_)),
            ) => {
                warn!(
                    word = raw,
                    error = %err,
                    elapsed_micros = latency.as_micros(),
                    "lookup_failed"
                );
            }
            _ => debug!(
                word = raw,
                outcome = ?outcome,
                elapsed_micros = latency.as_micros(),
                "lookup"
            ),
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_lookup(latency, outcome);
        }
        result
    }

    fn lookup_inner(&self, raw: &str) -> Result<Lookup, QueryError> {
        let (word, key) = match self.canonicalizer.key_for_raw(raw) {
            Ok(parsed) => parsed,
            Err(CanonicalError::InvalidInput { word, reason }) => {
                return Err(QueryError::InvalidInput {
                    word,
                    reason: reason.to_string(),
                });
            }
            // Such a word was rejected on the classification side too.
            Err(CanonicalError::KeyOverflow { .. }) => return Ok(Lookup::NotFound),
            Err(CanonicalError::InvalidConfig(reason)) => {
                return Err(QueryError::InvalidInput {
                    word: raw.to_string(),
                    reason,
                });
            }
        };

        if !self.ledger.is_target(&key, &word)? {
            return Ok(Lookup::NotFound);
        }

        let mut members = self.store.get_all(&key)?;
        if !self.cfg.include_query_word {
            members.retain(|member| member != &word);
        }
        self.cfg.order.sort(&mut members);

        Ok(Lookup::Found(
            members.into_iter().map(|w| w.into_string()).collect(),
        ))
    }
}
