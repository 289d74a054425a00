use std::fmt;

use serde::{Deserialize, Serialize};

/// Permutation-invariant identity of an anagram class.
///
/// Rendered as `<namespace>:<strategy tag>:<body>`, e.g. `anagram:sorted:aet`
/// or `anagram:prime:30`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub(crate) fn new(namespace: &str, tag: &str, body: impl fmt::Display) -> Self {
        Self(format!("{namespace}:{tag}:{body}"))
    }

    /// Rehydrate a key read back from storage.
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
