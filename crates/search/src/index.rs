//! Inverted index over workspace keys, maintained incrementally: a
//! write updates only the terms that changed rather than rebuilding the
//! whole index.

use crate::tokenizer::tokenize_unique;
use dashmap::DashMap;
use std::collections::HashSet;

/// The set of keys whose text contains a given term.
type PostingList = DashMap<String, ()>;

/// A term -> posting-list map, safe to share across threads without an
/// external lock (matches the single-writer/many-readers discipline the
/// rest of the store uses, since individual term buckets can be updated
/// independently).
#[derive(Default)]
pub struct InvertedIndex {
    postings: DashMap<String, PostingList>,
}

impl InvertedIndex {
    /// An empty index.
    pub fn new() -> Self {
        InvertedIndex {
            postings: DashMap::new(),
        }
    }

    /// Index `text` under `key`, replacing whatever terms `key` was
    /// previously indexed under. Call this on every save/update/restore
    /// so the index never drifts from live entries.
    pub fn index_document(&self, key: &str, text: &str) {
        self.remove_document(key);
        for term in tokenize_unique(text) {
            self.postings.entry(term).or_default().insert(key.to_string(), ());
        }
    }

    /// Remove every posting for `key`. Call this on delete/expire.
    pub fn remove_document(&self, key: &str) {
        self.postings.retain(|_, list| {
            list.remove(key);
            !list.is_empty()
        });
    }

    /// Keys whose indexed text contains at least one term from `query`,
    /// ranked by descending number of distinct matching query terms,
    /// then by key for a stable tie-break. Returns at most `limit` keys.
    pub fn search(&self, query: &str, limit: usize) -> Vec<String> {
        let query_terms = tokenize_unique(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<(String, usize)> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for term in &query_terms {
            if let Some(list) = self.postings.get(term) {
                for entry in list.iter() {
                    seen.insert(entry.key().clone());
                }
            }
        }
        for key in seen {
            let match_count = query_terms
                .iter()
                .filter(|term| {
                    self.postings
                        .get(term.as_str())
                        .map(|list| list.contains_key(&key))
                        .unwrap_or(false)
                })
                .count();
            hits.push((key, match_count));
        }

        hits.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        hits.truncate(limit);
        hits.into_iter().map(|(key, _)| key).collect()
    }

    /// Drop any term whose posting list has gone empty. `index_document`
    /// and `remove_document` already keep this true incrementally;
    /// this exists for callers rebuilding from a compacted snapshot.
    pub fn optimize_index(&self) {
        self.postings.retain(|_, list| !list.is_empty());
    }

    /// Number of distinct terms currently indexed.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Drop every indexed term. Used before a full rebuild from a
    /// restored or replayed table set.
    pub fn clear(&self) {
        self.postings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_document_by_term() {
        let idx = InvertedIndex::new();
        idx.index_document("a", "the quick brown fox");
        assert_eq!(idx.search("quick", 10), vec!["a".to_string()]);
    }

    #[test]
    fn reindexing_a_key_drops_old_terms() {
        let idx = InvertedIndex::new();
        idx.index_document("a", "alpha");
        idx.index_document("a", "beta");
        assert!(idx.search("alpha", 10).is_empty());
        assert_eq!(idx.search("beta", 10), vec!["a".to_string()]);
    }

    #[test]
    fn remove_document_clears_all_its_postings() {
        let idx = InvertedIndex::new();
        idx.index_document("a", "alpha beta");
        idx.remove_document("a");
        assert_eq!(idx.term_count(), 0);
    }

    #[test]
    fn ranks_more_matching_terms_first() {
        let idx = InvertedIndex::new();
        idx.index_document("a", "alpha beta");
        idx.index_document("b", "alpha");
        let results = idx.search("alpha beta", 10);
        assert_eq!(results, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn limit_truncates_results() {
        let idx = InvertedIndex::new();
        idx.index_document("a", "alpha");
        idx.index_document("b", "alpha");
        assert_eq!(idx.search("alpha", 1).len(), 1);
    }
}
