use crate::word::Word;

/// Letters of `word` sorted by code point.
///
/// `Word` is ASCII-only, so sorting bytes is the same as sorting chars.
pub fn sorted_letters(word: &Word) -> String {
    let mut bytes = word.as_str().as_bytes().to_vec();
    bytes.sort_unstable();
    // Sorting ASCII bytes cannot produce invalid UTF-8.
    bytes.into_iter().map(char::from).collect()
}
