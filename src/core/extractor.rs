//! Per-record hashtag extraction and pair generation
//!
//! A record is tokenized on whitespace, tokens that look like hashtags are
//! collected into a set, and every unordered pair of distinct tags is emitted
//! once with a count of one. Nothing here allocates beyond the tag set and the
//! keys themselves, and nothing can fail.

use super::pair_key::PairKey;
use std::collections::BTreeSet;
use std::iter::FusedIterator;

/// Character every tag starts with
pub const TAG_PREFIX: char = '#';

/// Token delimiters: space, tab, newline, carriage return, form feed
pub const TOKEN_DELIMITERS: [char; 5] = [' ', '\t', '\n', '\r', '\x0c'];

/// Check whether a token is a tag
///
/// A tag starts with `#` and has at least one character after it. The token is
/// taken verbatim; no case folding or punctuation stripping.
pub fn is_tag(token: &str) -> bool {
    token.starts_with(TAG_PREFIX) && token.len() > TAG_PREFIX.len_utf8()
}

/// Split a record into its non-empty tokens
pub fn tokenize(record: &str) -> impl Iterator<Item = &str> {
    record
        .split(TOKEN_DELIMITERS)
        .filter(|token| !token.is_empty())
}

/// Collect the distinct tags of a record
///
/// The set is ordered, which is what gives pair keys their canonical form.
pub fn tag_set(record: &str) -> BTreeSet<&str> {
    tokenize(record).filter(|token| is_tag(token)).collect()
}

/// Generate the co-occurrence contributions of one record
///
/// # Examples
///
/// ```
/// use tagpairs::core::extract;
///
/// let keys: Vec<String> = extract("#a #b #c")
///     .map(|(key, _)| key.into_string())
///     .collect();
/// assert_eq!(keys, vec!["#a_#b", "#a_#c", "#b_#c"]);
///
/// assert_eq!(extract("hello world").count(), 0);
/// assert_eq!(extract("#onlyone").count(), 0);
/// ```
pub fn extract(record: &str) -> TagPairs<'_> {
    TagPairs::new(tag_set(record))
}

/// Lazy iterator over every unordered pair of a tag set
///
/// Yields `(key, 1)` for each pair `(tags[i], tags[j])` with `i < j`, so a set
/// of `n` tags produces exactly `n * (n - 1) / 2` items.
#[derive(Debug, Clone)]
pub struct TagPairs<'a> {
    tags: Vec<&'a str>,
    first: usize,
    second: usize,
}

impl<'a> TagPairs<'a> {
    pub fn new(tags: BTreeSet<&'a str>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
            first: 0,
            second: 1,
        }
    }

    /// Tags the pairs are drawn from, in visiting order
    pub fn tags(&self) -> &[&'a str] {
        &self.tags
    }

    fn remaining(&self) -> usize {
        let n = self.tags.len();
        if self.first >= n {
            return 0;
        }
        // Rest of the current row plus every full row after it
        let current_row = n.saturating_sub(self.second);
        let rows_after = n - self.first - 1;
        current_row + rows_after * rows_after.saturating_sub(1) / 2
    }
}

impl Iterator for TagPairs<'_> {
    type Item = (PairKey, u64);

    fn next(&mut self) -> Option<Self::Item> {
        while self.first < self.tags.len() {
            if self.second < self.tags.len() {
                let key = PairKey::from_tags(self.tags[self.first], self.tags[self.second]);
                self.second += 1;
                return Some((key, 1));
            }
            self.first += 1;
            self.second = self.first + 1;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TagPairs<'_> {}

impl FusedIterator for TagPairs<'_> {}
