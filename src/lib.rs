//! Workspace umbrella crate for incremental anagram classification.
//!
//! Stitches the canonicalizer, group store, ledger, classifier and query
//! service together behind one YAML-driven [`Pipeline`]. Each stage is also
//! re-exported for callers that want to wire things by hand.
//!
//! ```
//! use anagram::{AnagramConfig, Lookup, Pipeline};
//!
//! let pipeline = Pipeline::open(AnagramConfig::default()).unwrap();
//! let targets = vec!["tea".to_string()];
//! let candidates = vec!["eat".to_string(), "ate".to_string(), "dog".to_string()];
//!
//! let report = pipeline.classify(&targets, &candidates).unwrap();
//! assert_eq!(report.appended, 3);
//!
//! let service = pipeline.query_service().unwrap();
//! assert_eq!(
//!     service.lookup("tea").unwrap(),
//!     Lookup::Found(vec!["eat".into(), "tea".into(), "ate".into()])
//! );
//! ```

pub mod config;

pub use crate::config::{AnagramConfig, CanonicalYamlConfig, ConfigLoadError};

pub use canonical::{
    canonicalize, canonicalize_str, CanonicalError, CanonicalKey, CanonicalizeConfig,
    Canonicalizer, KeyStrategy, Word,
};
pub use classifier::{
    read_words, read_words_from_path, Classifier, ClassifierConfig, ClassifierState,
    ClassifyError, ClassifyReport,
};
pub use index::{BackendConfig, GroupStore, InMemoryBackend, IndexError, StoreBackend};
pub use ledger::{Ledger, LedgerError, LedgerSnapshot, LedgerView, RecordOutcome};
pub use query::{
    DisplayOrder, Lookup, LookupOutcome, QueryConfig, QueryError, QueryMetrics, QueryService,
};

#[cfg(feature = "backend-redb")]
pub use index::RedbBackend;

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

/// Errors raised while wiring or running the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration failure: {0}")]
    Config(#[from] ConfigLoadError),
    #[error("canonicalization failure: {0}")]
    Canonical(#[from] CanonicalError),
    #[error("store failure: {0}")]
    Store(#[from] IndexError),
    #[error("ledger failure: {0}")]
    Ledger(#[from] LedgerError),
    #[error("classification failure: {0}")]
    Classify(#[from] ClassifyError),
}

/// One configured store plus constructors for every stage that uses it.
///
/// Groups and ledger entries share the store, so open one `Pipeline` per
/// database; a redb file cannot be opened twice by the same process.
pub struct Pipeline {
    config: AnagramConfig,
    canonical: CanonicalizeConfig,
    store: GroupStore,
}

impl Pipeline {
    pub fn open(config: AnagramConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let canonical = config.canonical.to_config()?;
        let store = GroupStore::new(&config.store)?;
        info!(
            backend = ?config.store,
            strategy = canonical.strategy.tag(),
            "pipeline_open"
        );
        Ok(Self {
            config,
            canonical,
            store,
        })
    }

    /// Load the YAML file at `path` and open its store.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        Self::open(AnagramConfig::from_file(path)?)
    }

    pub fn config(&self) -> &AnagramConfig {
        &self.config
    }

    pub fn store(&self) -> &GroupStore {
        &self.store
    }

    pub fn canonicalizer(&self) -> Result<Canonicalizer, PipelineError> {
        Ok(Canonicalizer::new(self.canonical.clone())?)
    }

    /// Load the ledger. Fails with [`LedgerError::Corrupted`] rather than
    /// starting over; see [`Pipeline::rebuild_ledger`].
    pub fn open_ledger(&self) -> Result<Ledger, PipelineError> {
        Ok(Ledger::open(self.store.backend())?)
    }

    pub fn classifier(&self) -> Result<Classifier, PipelineError> {
        let ledger = Arc::new(self.open_ledger()?);
        Ok(Classifier::new(
            self.canonicalizer()?,
            ledger,
            self.store.clone(),
            self.config.classifier.clone(),
        )?)
    }

    pub fn query_service(&self) -> Result<QueryService, PipelineError> {
        Ok(QueryService::new(
            self.canonicalizer()?,
            self.store.clone(),
            self.config.query.clone(),
        ))
    }

    /// Run a full classification with batch retries.
    pub fn classify(
        &self,
        targets: &[String],
        candidates: &[String],
    ) -> Result<ClassifyReport, PipelineError> {
        Ok(self.classifier()?.run_with_retry(targets, candidates)?)
    }

    pub fn classify_files(
        &self,
        targets: &Path,
        candidates: &Path,
    ) -> Result<ClassifyReport, PipelineError> {
        Ok(self.classifier()?.run_files(targets, candidates)?)
    }

    /// Replace the ledger with one derived from `targets` and the groups
    /// already in the store.
    pub fn rebuild_ledger(&self, targets: &[String]) -> Result<Ledger, PipelineError> {
        Ok(classifier::rebuild_ledger(
            self.store.backend(),
            &self.store,
            &self.canonicalizer()?,
            targets,
        )?)
    }

    pub fn export_ledger(&self, path: &Path) -> Result<LedgerSnapshot, PipelineError> {
        Ok(self.open_ledger()?.export_snapshot(path)?)
    }

    pub fn import_ledger(&self, path: &Path) -> Result<Ledger, PipelineError> {
        Ok(Ledger::import_snapshot(self.store.backend(), path)?)
    }
}
