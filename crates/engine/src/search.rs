//! Full-text search over a workspace's plaintext values.

use crate::workspace::Workspace;
use kybase_core::{Result, Value};

/// One search result. `value` is populated unless the caller asked for
/// `keys_only`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// The matching key.
    pub key: String,
    /// The key's current value, unless `keys_only` was requested.
    pub value: Option<Value>,
}

impl Workspace {
    /// Search the full-text index, returning at most `limit` matches
    /// ranked by relevance (tie-broken by key ascending). Encrypted
    /// values are never indexed, so they never match.
    pub fn search(&self, query: &str, limit: usize, keys_only: bool) -> Result<Vec<SearchHit>> {
        self.require_kv_mode("search")?;
        let keys = self.index.search(query, limit);
        keys.into_iter()
            .map(|key| {
                let value = if keys_only { None } else { self.getkey(&key, true).ok() };
                Ok(SearchHit { key, value })
            })
            .collect()
    }

    /// Rebuild the inverted index's internal structures for compactness
    /// and query speed. Safe to call at any time; a no-op on results.
    pub fn optimize_index(&self) {
        self.index.optimize_index();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use tempfile::tempdir;

    #[test]
    fn search_finds_matching_values_ranked_by_key() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::new(dir.path());
        let ws = Workspace::open("default", &dir.path().join("default"), &config).unwrap();
        ws.save("a", Value::Text("the quick brown fox".to_string()), None).unwrap();
        ws.save("b", Value::Text("lazy dog".to_string()), None).unwrap();

        let hits = ws.search("fox", 10, true).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "a");
        assert!(hits[0].value.is_none());
    }

    #[test]
    fn search_without_keys_only_includes_values() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::new(dir.path());
        let ws = Workspace::open("default", &dir.path().join("default"), &config).unwrap();
        ws.save("a", Value::Text("hello world".to_string()), None).unwrap();

        let hits = ws.search("hello", 10, false).unwrap();
        assert_eq!(hits[0].value, Some(Value::Text("hello world".to_string())));
    }
}
