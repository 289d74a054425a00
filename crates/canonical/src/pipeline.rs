use std::sync::Mutex;

use crate::config::{CanonicalizeConfig, KeyStrategy};
use crate::error::CanonicalError;
use crate::key::CanonicalKey;
use crate::prime::{prime_product, PrimeProductCache};
use crate::sorted::sorted_letters;
use crate::word::Word;

/// Main entry point. Derives the canonical key of an already parsed word.
pub fn canonicalize(word: &Word, cfg: &CanonicalizeConfig) -> Result<CanonicalKey, CanonicalError> {
    cfg.validate()?;
    derive_key(word, cfg)
}

/// Key derivation for a config that already passed `validate`.
fn derive_key(word: &Word, cfg: &CanonicalizeConfig) -> Result<CanonicalKey, CanonicalError> {
    check_len(word, cfg)?;

    let tag = cfg.strategy.tag();
    match cfg.strategy {
        KeyStrategy::Sorted => Ok(CanonicalKey::new(&cfg.namespace, tag, sorted_letters(word))),
        KeyStrategy::PrimeProduct => Ok(CanonicalKey::new(
            &cfg.namespace,
            tag,
            prime_product(word)?,
        )),
    }
}

/// Parse raw input and derive its key in one step.
pub fn canonicalize_str(
    raw: &str,
    cfg: &CanonicalizeConfig,
) -> Result<(Word, CanonicalKey), CanonicalError> {
    let word = Word::parse(raw)?;
    let key = canonicalize(&word, cfg)?;
    Ok((word, key))
}

fn check_len(word: &Word, cfg: &CanonicalizeConfig) -> Result<(), CanonicalError> {
    if word.len() > cfg.max_word_len {
        return Err(CanonicalError::invalid(
            word.as_str(),
            "longer than max_word_len",
        ));
    }
    Ok(())
}

/// A validated configuration bundled with an optional prefix cache.
///
/// `Canonicalizer` is `Send + Sync`; the prefix cache sits behind a mutex, so
/// enable it for single-threaded runs over sorted word lists and leave it
/// off for parallel scans.
#[derive(Debug)]
pub struct Canonicalizer {
    cfg: CanonicalizeConfig,
    prefix_cache: Option<Mutex<PrimeProductCache>>,
}

impl Canonicalizer {
    pub fn new(cfg: CanonicalizeConfig) -> Result<Self, CanonicalError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            prefix_cache: None,
        })
    }

    /// Memoize prime-product prefixes. Ignored by the sorted strategy.
    pub fn with_prefix_cache(mut self, capacity: usize) -> Self {
        if self.cfg.strategy == KeyStrategy::PrimeProduct {
            self.prefix_cache = Some(Mutex::new(PrimeProductCache::new(capacity)));
        }
        self
    }

    pub fn config(&self) -> &CanonicalizeConfig {
        &self.cfg
    }

    pub fn key_for(&self, word: &Word) -> Result<CanonicalKey, CanonicalError> {
        let Some(cache) = &self.prefix_cache else {
            return derive_key(word, &self.cfg);
        };
        check_len(word, &self.cfg)?;
        let product = match cache.lock() {
            Ok(mut guard) => guard.product(word)?,
            // A panicked holder may have left the cache half-written.
            Err(_) => prime_product(word)?,
        };
        Ok(CanonicalKey::new(
            &self.cfg.namespace,
            KeyStrategy::PrimeProduct.tag(),
            product,
        ))
    }

    pub fn key_for_raw(&self, raw: &str) -> Result<(Word, CanonicalKey), CanonicalError> {
        let word = Word::parse(raw)?;
        let key = self.key_for(&word)?;
        Ok((word, key))
    }
}
