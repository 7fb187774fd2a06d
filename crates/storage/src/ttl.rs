//! Expiry index: a time-ordered structure mapping expiry timestamp to
//! the set of keys expiring at that instant, letting lazy and proactive
//! purge find expired keys without scanning every entry.

use std::collections::{BTreeMap, HashSet};

/// Index of `(expires_at micros) -> keys expiring then`.
#[derive(Debug, Clone, Default)]
pub struct TTLIndex {
    by_expiry: BTreeMap<u64, HashSet<String>>,
}

impl TTLIndex {
    /// An empty index.
    pub fn new() -> Self {
        TTLIndex {
            by_expiry: BTreeMap::new(),
        }
    }

    /// Record that `key` expires at `expires_at`.
    pub fn insert(&mut self, expires_at: u64, key: String) {
        self.by_expiry.entry(expires_at).or_default().insert(key);
    }

    /// Remove the `(expires_at, key)` pair, e.g. because the entry was
    /// overwritten, deleted, or its TTL cleared.
    pub fn remove(&mut self, expires_at: u64, key: &str) {
        if let Some(keys) = self.by_expiry.get_mut(&expires_at) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_expiry.remove(&expires_at);
            }
        }
    }

    /// Every key whose expiry is `<= now`, oldest expiry first.
    pub fn find_expired(&self, now: u64) -> Vec<String> {
        self.by_expiry
            .range(..=now)
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect()
    }

    /// Drop every `(expiry, key)` pair with expiry `<= now`. Callers are
    /// expected to have already removed the corresponding Entry rows.
    pub fn remove_expired(&mut self, now: u64) {
        let expired_timestamps: Vec<u64> = self.by_expiry.range(..=now).map(|(ts, _)| *ts).collect();
        for ts in expired_timestamps {
            self.by_expiry.remove(&ts);
        }
    }

    /// Number of distinct expiry timestamps tracked. Exposed for tests
    /// and metrics, not a stable count of keys.
    pub fn timestamp_count(&self) -> usize {
        self.by_expiry.len()
    }

    /// True if no key has a pending expiry.
    pub fn is_empty(&self) -> bool {
        self.by_expiry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_only_keys_at_or_before_now() {
        let mut idx = TTLIndex::new();
        idx.insert(100, "a".to_string());
        idx.insert(200, "b".to_string());
        let expired = idx.find_expired(150);
        assert_eq!(expired, vec!["a".to_string()]);
    }

    #[test]
    fn remove_drops_key_and_collapses_empty_bucket() {
        let mut idx = TTLIndex::new();
        idx.insert(100, "a".to_string());
        idx.remove(100, "a");
        assert!(idx.is_empty());
    }

    #[test]
    fn remove_expired_clears_buckets_but_not_entries() {
        let mut idx = TTLIndex::new();
        idx.insert(100, "a".to_string());
        idx.insert(300, "b".to_string());
        idx.remove_expired(200);
        assert_eq!(idx.timestamp_count(), 1);
        assert_eq!(idx.find_expired(1_000), vec!["b".to_string()]);
    }

    #[test]
    fn multiple_keys_share_one_timestamp() {
        let mut idx = TTLIndex::new();
        idx.insert(100, "a".to_string());
        idx.insert(100, "b".to_string());
        let mut expired = idx.find_expired(100);
        expired.sort();
        assert_eq!(expired, vec!["a".to_string(), "b".to_string()]);
    }
}
