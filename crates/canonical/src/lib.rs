//! Anagram canonical key layer.
//!
//! Maps a word to a key shared by exactly its letter permutations. Downstream
//! stages (ledger, classifier, query) rely on this for group identity.
//!
//! ## What we do
//!
//! - Word validation: trim, lowercase, ASCII letters only
//! - Sorted-letter keys (`anagram:sorted:aet`)
//! - Prime-product keys (`anagram:prime:30`) with checked `u128` arithmetic
//! - Optional prefix memoization for prime products over sorted word lists
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no locale dependence. Same word and config give
//! the same key on any machine.
//!
//! ## Invariants worth knowing
//!
//! - Both strategies group words identically
//! - Non-anagrams never share a key; prime products that would wrap are
//!   rejected with [`CanonicalError::KeyOverflow`]
//! - Keys embed the namespace and strategy tag, so sorted and prime keys
//!   never collide in a shared store

mod config;
mod error;
mod key;
mod pipeline;
mod prime;
mod sorted;
mod word;

pub use crate::config::{CanonicalizeConfig, KeyStrategy, DEFAULT_MAX_WORD_LEN};
pub use crate::error::CanonicalError;
pub use crate::key::CanonicalKey;
pub use crate::pipeline::{canonicalize, canonicalize_str, Canonicalizer};
pub use crate::prime::{prime_product, PrimeProductCache, GUARANTEED_PRIME_LEN};
pub use crate::sorted::sorted_letters;
pub use crate::word::Word;

#[cfg(test)]
mod tests {
    use super::*;

    fn strategies() -> [CanonicalizeConfig; 2] {
        [
            CanonicalizeConfig::default(),
            CanonicalizeConfig::default().with_strategy(KeyStrategy::PrimeProduct),
        ]
    }

    fn key(raw: &str, cfg: &CanonicalizeConfig) -> CanonicalKey {
        canonicalize_str(raw, cfg).expect("canonicalize").1
    }

    #[test]
    fn sorted_key_layout() {
        let cfg = CanonicalizeConfig::default();
        assert_eq!(key("Tea", &cfg).as_str(), "anagram:sorted:aet");
    }

    #[test]
    fn prime_key_layout() {
        let cfg = CanonicalizeConfig::default().with_strategy(KeyStrategy::PrimeProduct);
        assert_eq!(key("tea", &cfg).as_str(), "anagram:prime:30");
    }

    #[test]
    fn permutations_share_a_key() {
        for cfg in strategies() {
            let base = key("listen", &cfg);
            for perm in ["silent", "enlist", "tinsel", "inlets", "LISTEN"] {
                assert_eq!(key(perm, &cfg), base, "{perm} under {:?}", cfg.strategy);
            }
        }
    }

    #[test]
    fn non_permutations_differ() {
        let pairs = [
            ("tea", "tee"),
            ("ab", "abb"),
            ("stop", "spots"),
            ("aab", "abb"),
            ("a", "b"),
        ];
        for cfg in strategies() {
            for (a, b) in pairs {
                assert_ne!(key(a, &cfg), key(b, &cfg), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn strategies_group_identically() {
        let words = [
            "tea", "eat", "ate", "tae", "stop", "pots", "tops", "opts", "post", "spot", "dog",
            "god", "odg", "banana", "nabana",
        ];
        let sorted_cfg = CanonicalizeConfig::default();
        let prime_cfg = CanonicalizeConfig::default().with_strategy(KeyStrategy::PrimeProduct);
        for a in words {
            for b in words {
                let same_sorted = key(a, &sorted_cfg) == key(b, &sorted_cfg);
                let same_prime = key(a, &prime_cfg) == key(b, &prime_cfg);
                assert_eq!(same_sorted, same_prime, "{a} vs {b}");
            }
        }
    }

    #[test]
    fn strategies_never_collide_with_each_other() {
        let sorted_cfg = CanonicalizeConfig::default();
        let prime_cfg = CanonicalizeConfig::default().with_strategy(KeyStrategy::PrimeProduct);
        assert_ne!(key("tea", &sorted_cfg), key("tea", &prime_cfg));
    }

    #[test]
    fn empty_and_non_alphabetic_rejected() {
        for cfg in strategies() {
            for raw in ["", "   ", "it's", "x1", "hello world"] {
                assert!(matches!(
                    canonicalize_str(raw, &cfg),
                    Err(CanonicalError::InvalidInput { .. })
                ));
            }
        }
    }

    #[test]
    fn max_word_len_enforced() {
        let cfg = CanonicalizeConfig {
            max_word_len: 3,
            ..Default::default()
        };
        assert!(canonicalize_str("abc", &cfg).is_ok());
        assert!(matches!(
            canonicalize_str("abcd", &cfg),
            Err(CanonicalError::InvalidInput { .. })
        ));
    }

    #[test]
    fn invalid_config_version_rejected() {
        let cfg = CanonicalizeConfig {
            version: 0,
            ..Default::default()
        };
        let word = Word::parse("tea").unwrap();
        assert!(matches!(
            canonicalize(&word, &cfg),
            Err(CanonicalError::InvalidConfig(_))
        ));
        assert!(Canonicalizer::new(cfg).is_err());
    }

    #[test]
    fn namespace_validation() {
        let word = Word::parse("tea").unwrap();
        for bad in ["bad:ns", "", "  "] {
            let cfg = CanonicalizeConfig::default().with_namespace(bad);
            assert!(matches!(
                cfg.validate(),
                Err(CanonicalError::InvalidConfig(_))
            ));
            assert!(matches!(
                canonicalize(&word, &cfg),
                Err(CanonicalError::InvalidConfig(_))
            ));
        }
        let cfg = CanonicalizeConfig::default().with_namespace("words");
        assert_eq!(key("tea", &cfg).as_str(), "words:sorted:aet");
    }

    #[test]
    fn canonicalizer_with_cache_matches_plain() {
        let cfg = CanonicalizeConfig::default().with_strategy(KeyStrategy::PrimeProduct);
        let plain = Canonicalizer::new(cfg.clone()).unwrap();
        let cached = Canonicalizer::new(cfg).unwrap().with_prefix_cache(64);
        for raw in ["stone", "stones", "notes", "onset", "seton"] {
            assert_eq!(
                plain.key_for_raw(raw).unwrap(),
                cached.key_for_raw(raw).unwrap()
            );
        }
    }
}
