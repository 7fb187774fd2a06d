//! Splits stored text into the terms the inverted index keys on.

use unicode_segmentation::UnicodeSegmentation;

/// Minimum term length kept in the index; shorter tokens (articles,
/// single letters) add index bloat with little recall value.
const MIN_TERM_LEN: usize = 2;

/// Lowercase, split on non-alphanumeric Unicode word boundaries, and
/// drop terms shorter than [`MIN_TERM_LEN`]. Duplicate terms are kept —
/// callers that need a term set use [`tokenize_unique`].
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() >= MIN_TERM_LEN)
        .collect()
}

/// Like [`tokenize`], but deduplicated — the representation an inverted
/// index posting actually wants, since "contains the term" does not
/// care how many times it occurs.
pub fn tokenize_unique(text: &str) -> Vec<String> {
    let mut terms = tokenize(text);
    terms.sort();
    terms.dedup();
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_punctuation() {
        let terms = tokenize("Hello, World! foo-bar");
        assert_eq!(terms, vec!["hello", "world", "foo", "bar"]);
    }

    #[test]
    fn drops_short_terms() {
        let terms = tokenize("a ab abc");
        assert_eq!(terms, vec!["ab", "abc"]);
    }

    #[test]
    fn unique_dedups_and_sorts() {
        let terms = tokenize_unique("foo bar foo baz bar");
        assert_eq!(terms, vec!["bar", "baz", "foo"]);
    }

    #[test]
    fn empty_input_yields_no_terms() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }
}
