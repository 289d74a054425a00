//! Prime-product anagram keys.
//!
//! Each letter maps to a distinct prime; a word's key is the product of the
//! primes of its letters. Unique factorization makes the product identical
//! for every permutation and distinct for every other multiset of letters,
//! as long as the multiplication never wraps.
//!
//! # Numeric bound
//!
//! Products are computed in `u128` with checked multiplication. A word whose
//! product would exceed `u128::MAX` fails with
//! [`CanonicalError::KeyOverflow`] rather than producing a wrapped value.
//! The largest prime is 101 and `101^19 < 2^128`, so every word of up to
//! [`GUARANTEED_PRIME_LEN`] letters always fits. Longer words fit whenever
//! their letters are common enough.
//!
//! Primes are assigned by English letter frequency (`e` = 2, `t` = 3, ...)
//! so typical words stay far below the bound.

use fxhash::FxHashMap;

use crate::error::CanonicalError;
use crate::word::Word;

/// Words of this length or shorter can never overflow.
pub const GUARANTEED_PRIME_LEN: usize = 19;

/// Prime for each letter `a..=z`, assigned in frequency order
/// `etaoinshrdlcumwfgypbvkjxqz`.
const LETTER_PRIMES: [u128; 26] = [
    5,   // a
    71,  // b
    37,  // c
    29,  // d
    2,   // e
    53,  // f
    59,  // g
    19,  // h
    11,  // i
    83,  // j
    79,  // k
    31,  // l
    43,  // m
    13,  // n
    7,   // o
    67,  // p
    97,  // q
    23,  // r
    17,  // s
    3,   // t
    41,  // u
    73,  // v
    47,  // w
    89,  // x
    61,  // y
    101, // z
];

#[inline]
fn letter_prime(byte: u8) -> u128 {
    LETTER_PRIMES[(byte - b'a') as usize]
}

/// Product of the letter primes of `word`.
pub fn prime_product(word: &Word) -> Result<u128, CanonicalError> {
    extend_product(1, word.as_str().as_bytes(), word)
}

fn extend_product(start: u128, letters: &[u8], word: &Word) -> Result<u128, CanonicalError> {
    letters.iter().try_fold(start, |acc, &b| {
        acc.checked_mul(letter_prime(b))
            .ok_or_else(|| CanonicalError::KeyOverflow {
                word: word.as_str().to_string(),
            })
    })
}

/// Memoizes products of word prefixes.
///
/// Word lists are usually sorted, so consecutive words share long prefixes:
/// `product(w[..k]) = product(w[..k-1]) * p(w[k-1])` lets the next word reuse
/// the longest cached prefix. The cache is cleared once it reaches
/// `capacity` entries.
#[derive(Debug)]
pub struct PrimeProductCache {
    prefixes: FxHashMap<Box<str>, u128>,
    capacity: usize,
    hits: u64,
}

impl PrimeProductCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            prefixes: FxHashMap::default(),
            capacity: capacity.max(1),
            hits: 0,
        }
    }

    /// Number of lookups that reused a cached prefix.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn product(&mut self, word: &Word) -> Result<u128, CanonicalError> {
        let text = word.as_str();

        let mut cached_len = 0;
        let mut acc = 1u128;
        for k in (1..=text.len()).rev() {
            if let Some(&product) = self.prefixes.get(&text[..k]) {
                cached_len = k;
                acc = product;
                self.hits += 1;
                break;
            }
        }

        if self.prefixes.len() + (text.len() - cached_len) > self.capacity {
            self.prefixes.clear();
        }

        for k in cached_len..text.len() {
            acc = extend_product(acc, &text.as_bytes()[k..=k], word)?;
            if self.prefixes.len() < self.capacity {
                self.prefixes.insert(text[..=k].into(), acc);
            }
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> Word {
        Word::parse(s).unwrap()
    }

    #[test]
    fn primes_are_distinct() {
        let mut primes = LETTER_PRIMES.to_vec();
        primes.sort_unstable();
        primes.dedup();
        assert_eq!(primes.len(), 26);
    }

    #[test]
    fn product_is_permutation_invariant() {
        assert_eq!(
            prime_product(&word("tea")).unwrap(),
            prime_product(&word("eat")).unwrap()
        );
        // t * e * a = 3 * 2 * 5
        assert_eq!(prime_product(&word("tea")).unwrap(), 30);
    }

    #[test]
    fn guaranteed_length_never_overflows() {
        let worst = "z".repeat(GUARANTEED_PRIME_LEN);
        assert!(prime_product(&word(&worst)).is_ok());
    }

    #[test]
    fn overflow_is_reported() {
        let too_long = "z".repeat(GUARANTEED_PRIME_LEN + 1);
        assert!(matches!(
            prime_product(&word(&too_long)),
            Err(CanonicalError::KeyOverflow { .. })
        ));
    }

    #[test]
    fn common_letters_fit_beyond_guaranteed_length() {
        let long = "e".repeat(100);
        assert_eq!(prime_product(&word(&long)).unwrap(), 1u128 << 100);
    }

    #[test]
    fn cache_matches_direct_product_and_reuses_prefixes() {
        let mut cache = PrimeProductCache::new(1024);
        for w in ["stone", "stones", "stoned", "tones", "onset"] {
            let w = word(w);
            assert_eq!(cache.product(&w).unwrap(), prime_product(&w).unwrap());
        }
        assert!(cache.hits() >= 2);
    }

    #[test]
    fn cache_clears_when_full() {
        let mut cache = PrimeProductCache::new(4);
        cache.product(&word("abc")).unwrap();
        cache.product(&word("xyz")).unwrap();
        assert!(cache.len() <= 4);
        assert_eq!(
            cache.product(&word("zyx")).unwrap(),
            prime_product(&word("xyz")).unwrap()
        );
    }

    #[test]
    fn word_longer_than_capacity_stays_within_bound() {
        let mut cache = PrimeProductCache::new(4);
        let long = word("abcdefghij");
        assert_eq!(cache.product(&long).unwrap(), prime_product(&long).unwrap());
        assert!(cache.len() <= 4);

        cache.product(&word("klmnopqrst")).unwrap();
        assert!(cache.len() <= 4);
    }
}
