//! Canonical keys for unordered tag pairs

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Separator placed between the two tags of a pair key
pub const PAIR_SEPARATOR: char = '_';

/// Key identifying an unordered pair of distinct tags
///
/// The two tags are joined with [`PAIR_SEPARATOR`] in lexicographic order, so
/// `#b` and `#a` always produce `#a_#b` no matter which one was seen first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairKey(String);

impl PairKey {
    /// Build the canonical key for two tags
    pub fn from_tags(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let mut key = String::with_capacity(first.len() + second.len() + 1);
        key.push_str(first);
        key.push(PAIR_SEPARATOR);
        key.push_str(second);
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Wrap an already-canonical key string, e.g. one read back from a previous
/// job's output
impl From<String> for PairKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for PairKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl AsRef<str> for PairKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PairKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_tags_orders_lexicographically() {
        assert_eq!(PairKey::from_tags("#a", "#b").as_str(), "#a_#b");
        assert_eq!(PairKey::from_tags("#b", "#a").as_str(), "#a_#b");
    }

    #[test]
    fn test_from_tags_is_case_sensitive() {
        // Uppercase sorts before lowercase in byte order
        let key = PairKey::from_tags("#rust", "#Rust");
        assert_eq!(key.as_str(), "#Rust_#rust");
    }

    #[test]
    fn test_lookup_by_str() {
        let mut counts = HashMap::new();
        counts.insert(PairKey::from_tags("#x", "#y"), 3u64);
        assert_eq!(counts.get("#x_#y"), Some(&3));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let key = PairKey::from_tags("#a", "#b");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"#a_#b\"");
    }
}
