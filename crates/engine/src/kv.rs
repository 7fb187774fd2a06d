//! Key-value mode operations: `save`, `patch`, `push`, `remove`,
//! `delete`, `restore`, `listkeys`, `getkey`, `save_many`, and the
//! dict-like convenience surface over them.

use crate::workspace::{now_micros, Workspace};
use kybase_core::{Error, Key, Result, Value};
use kybase_storage::Mutation;
use regex::Regex;
use std::time::Duration;

/// The result of a single `save`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The key had no prior Entry.
    Created,
    /// The key existed and its value changed.
    Overwritten,
    /// The key existed and the new value's canonical encoding matched
    /// the stored one; no mutation was committed.
    NoChange,
}

impl Workspace {
    /// Insert or overwrite `key`'s value, optionally with a TTL.
    pub fn save(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<SaveOutcome> {
        let _guard = self.lock_for_write()?;
        self.save_locked(key, value, ttl)
    }

    /// The body of `save`, assuming the write lock is already held by
    /// the caller. Used by `patch`/`push_value`/`remove_value` so they
    /// can wrap their own read-decide-commit sequence in a single lock
    /// acquisition without deadlocking on `save`'s own lock.
    fn save_locked(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<SaveOutcome> {
        let span = tracing::debug_span!("save", workspace = %self.name(), key);
        let _enter = span.enter();

        self.require_kv_mode("save")?;
        let key = Key::new(key)?;
        reject_empty_value(&value)?;
        let value = self.validator.validate(key.as_str(), value)?;
        let (bytes, encrypted) = self.encode_value(&value)?;

        let existing = self.store.read(|t| t.entries.get(key.as_str()).cloned());
        if let Some(row) = &existing {
            let existing_value = self.decode_value(&row.value, row.encrypted)?;
            if existing_value.canonical_encode() == value.canonical_encode() {
                tracing::debug!(outcome = "nochange", "save skipped");
                return Ok(SaveOutcome::NoChange);
            }
        }

        let now = now_micros();
        let expires_at = ttl.map(|d| now.saturating_add(d.as_micros() as u64));
        let is_create = existing.is_none();
        self.store.commit(vec![Mutation::SaveEntry {
            key: key.as_str().to_string(),
            value: bytes,
            encrypted,
            created_at: if is_create { Some(now) } else { None },
            updated_at: now,
            expires_at,
            is_create,
        }])?;

        if encrypted {
            self.index.remove_document(key.as_str());
        } else {
            self.index.index_document(key.as_str(), &value.canonical_encode());
        }

        tracing::debug!(outcome = if is_create { "created" } else { "overwritten" }, "save committed");
        Ok(if is_create {
            SaveOutcome::Created
        } else {
            SaveOutcome::Overwritten
        })
    }

    /// Save every `(key, value, ttl)` triple in one transaction; if any
    /// entry fails validation the whole batch is rejected before
    /// anything is committed.
    pub fn save_many(&self, items: Vec<(String, Value, Option<Duration>)>) -> Result<Vec<SaveOutcome>> {
        let span = tracing::debug_span!("save_many", workspace = %self.name(), count = items.len());
        let _enter = span.enter();

        let _guard = self.lock_for_write()?;
        self.require_kv_mode("save_many")?;
        let now = now_micros();
        let mut mutations = Vec::with_capacity(items.len());
        let mut outcomes = Vec::with_capacity(items.len());
        let mut index_updates: Vec<(String, Option<String>)> = Vec::new();

        for (raw_key, value, ttl) in items {
            let key = Key::new(raw_key)?;
            reject_empty_value(&value)?;
            let value = self.validator.validate(key.as_str(), value)?;
            let (bytes, encrypted) = self.encode_value(&value)?;

            let existing = self.store.read(|t| t.entries.get(key.as_str()).cloned());
            if let Some(row) = &existing {
                let existing_value = self.decode_value(&row.value, row.encrypted)?;
                if existing_value.canonical_encode() == value.canonical_encode() {
                    outcomes.push(SaveOutcome::NoChange);
                    continue;
                }
            }
            let is_create = existing.is_none();
            let expires_at = ttl.map(|d| now.saturating_add(d.as_micros() as u64));
            mutations.push(Mutation::SaveEntry {
                key: key.as_str().to_string(),
                value: bytes,
                encrypted,
                created_at: if is_create { Some(now) } else { None },
                updated_at: now,
                expires_at,
                is_create,
            });
            index_updates.push((
                key.as_str().to_string(),
                if encrypted { None } else { Some(value.canonical_encode()) },
            ));
            outcomes.push(if is_create {
                SaveOutcome::Created
            } else {
                SaveOutcome::Overwritten
            });
        }

        if !mutations.is_empty() {
            self.store.commit(mutations)?;
        }
        for (key, text) in index_updates {
            match text {
                Some(text) => self.index.index_document(&key, &text),
                None => self.index.remove_document(&key),
            }
        }
        tracing::debug!(outcome = "committed", saved = outcomes.len(), "save_many committed");
        Ok(outcomes)
    }

    /// Update the sub-path `path` within the mapping/sequence stored at
    /// its first segment. `path` with no dotted suffix replaces the
    /// entire value, equivalent to `save`.
    pub fn patch(&self, path: &str, value: Value) -> Result<()> {
        let _guard = self.lock_for_write()?;
        self.require_kv_mode("patch")?;
        let (head, subpath) = Key::split_subpath(path);
        let Some(subpath) = subpath else {
            self.save_locked(head, value, None)?;
            return Ok(());
        };

        let key = Key::new(head)?;
        let row = self
            .store
            .read(|t| t.entries.get(key.as_str()).cloned())
            .ok_or(Error::NotFound)?;
        let mut current = self.decode_value(&row.value, row.encrypted)?;
        set_subpath(&mut current, subpath, value)?;
        self.save_locked(key.as_str(), current, None)?;
        Ok(())
    }

    /// Append `value` to the sequence stored at `key`, creating `[]`
    /// first if absent. With `unique`, a value already present yields
    /// no mutation.
    pub fn push_value(&self, key: &str, value: Value, unique: bool) -> Result<SaveOutcome> {
        let _guard = self.lock_for_write()?;
        self.require_kv_mode("push")?;
        let k = Key::new(key)?;
        let mut list = match self.store.read(|t| t.entries.get(k.as_str()).cloned()) {
            Some(row) => match self.decode_value(&row.value, row.encrypted)? {
                Value::List(items) => items,
                _ => return Err(Error::Validation(format!("{key} is not a sequence"))),
            },
            None => Vec::new(),
        };
        if unique && list.contains(&value) {
            return Ok(SaveOutcome::NoChange);
        }
        list.push(value);
        self.save_locked(k.as_str(), Value::List(list), None)
    }

    /// Remove every element equal to `value` from the sequence stored
    /// at `key`.
    pub fn remove_value(&self, key: &str, value: &Value) -> Result<()> {
        let _guard = self.lock_for_write()?;
        self.require_kv_mode("remove")?;
        let k = Key::new(key)?;
        let row = self
            .store
            .read(|t| t.entries.get(k.as_str()).cloned())
            .ok_or(Error::NotFound)?;
        let list = match self.decode_value(&row.value, row.encrypted)? {
            Value::List(items) => items,
            _ => return Err(Error::Validation(format!("{key} is not a sequence"))),
        };
        let filtered: Vec<Value> = list.into_iter().filter(|item| item != value).collect();
        self.save_locked(k.as_str(), Value::List(filtered), None)?;
        Ok(())
    }

    /// Move `key`'s current value to Archive and remove the live Entry.
    pub fn delete(&self, key: &str) -> Result<()> {
        let span = tracing::debug_span!("delete", workspace = %self.name(), key);
        let _enter = span.enter();

        let _guard = self.lock_for_write()?;
        self.require_kv_mode("delete")?;
        let k = Key::new(key)?;
        let exists = self.store.read(|t| t.entries.contains_key(k.as_str()));
        if !exists {
            tracing::debug!(outcome = "not_found", "delete found nothing");
            return Err(Error::NotFound);
        }
        self.store
            .commit(vec![Mutation::DeleteEntry { key: k.as_str().to_string(), at: now_micros() }])?;
        self.index.remove_document(k.as_str());
        tracing::debug!(outcome = "deleted", "delete committed");
        Ok(())
    }

    /// Reinstate `key`. Without `at_or_before`, revives from Archive if
    /// present, else the newest HistoryRecord. With `at_or_before`,
    /// finds the latest HistoryRecord at or before that timestamp.
    pub fn restore(&self, key: &str, at_or_before: Option<u64>) -> Result<()> {
        let span = tracing::debug_span!("restore", workspace = %self.name(), key);
        let _enter = span.enter();

        let _guard = self.lock_for_write()?;
        self.require_kv_mode("restore")?;
        let k = Key::new(key)?;

        let (value_bytes, encrypted) = if let Some(cutoff) = at_or_before {
            let record = self.store.read(|t| {
                t.history
                    .iter()
                    .rev()
                    .find(|r| r.key == k.as_str() && r.timestamp <= cutoff && r.value.is_some())
                    .cloned()
            });
            let record = match record {
                Some(record) => record,
                None => {
                    tracing::debug!(outcome = "not_found", "restore found nothing");
                    return Err(Error::NotFound);
                }
            };
            (record.value.unwrap(), record.encrypted)
        } else {
            let archived = self.store.read(|t| t.archive.get(k.as_str()).cloned());
            match archived {
                Some(row) => (row.value, row.encrypted),
                None => {
                    let record = self.store.read(|t| {
                        t.history
                            .iter()
                            .rev()
                            .find(|r| r.key == k.as_str() && r.value.is_some())
                            .cloned()
                    });
                    let record = match record {
                        Some(record) => record,
                        None => {
                            tracing::debug!(outcome = "not_found", "restore found nothing");
                            return Err(Error::NotFound);
                        }
                    };
                    (record.value.unwrap(), record.encrypted)
                }
            }
        };

        let now = now_micros();
        self.store.commit(vec![Mutation::RestoreEntry {
            key: k.as_str().to_string(),
            value: value_bytes.clone(),
            encrypted,
            at: now,
        }])?;
        if !encrypted {
            let value = self.decode_value(&value_bytes, encrypted)?;
            self.index.index_document(k.as_str(), &value.canonical_encode());
        }
        tracing::debug!(outcome = "restored", "restore committed");
        Ok(())
    }

    /// Live keys, optionally filtered by `pattern` (a regular
    /// expression matched as a substring).
    pub fn listkeys(&self, pattern: Option<&str>) -> Result<Vec<String>> {
        self.require_kv_mode("listkeys")?;
        self.purge_expired()?;
        let keys: Vec<String> = self.store.read(|t| t.entries.keys().cloned().collect());
        match pattern {
            None => Ok(keys),
            Some(pattern) => {
                let re = Regex::new(pattern).map_err(|e| Error::Validation(e.to_string()))?;
                Ok(keys.into_iter().filter(|k| re.is_match(k)).collect())
            }
        }
    }

    /// The value at `path` (optionally a dotted sub-path). `deserialize
    /// = false` returns the canonical textual form instead of the
    /// structured value.
    pub fn getkey(&self, path: &str, deserialize: bool) -> Result<Value> {
        self.require_kv_mode("getkey")?;
        let (head, subpath) = Key::split_subpath(path);
        let key = Key::new(head)?;

        if self.is_expired(key.as_str()) {
            self.purge_expired()?;
            return Err(Error::NotFound);
        }
        let row = self
            .store
            .read(|t| t.entries.get(key.as_str()).cloned())
            .ok_or(Error::NotFound)?;
        let value = self.decode_value(&row.value, row.encrypted)?;

        let resolved = match subpath {
            None => value,
            Some(subpath) => get_subpath(&value, subpath)?.clone(),
        };
        if deserialize {
            Ok(resolved)
        } else {
            Ok(Value::Text(resolved.canonical_encode()))
        }
    }

    /// True if `key` has a live, unexpired Entry.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = now_micros();
        self.store.read(|t| {
            t.entries
                .get(key)
                .map(|row| row.expires_at.map(|exp| exp > now).unwrap_or(true))
                .unwrap_or(false)
        })
    }

    /// Number of live entries (kv mode only; ignores expiry lazily not
    /// yet purged).
    pub fn len(&self) -> usize {
        let now = now_micros();
        self.store.read(|t| {
            t.entries
                .values()
                .filter(|row| row.expires_at.map(|exp| exp > now).unwrap_or(true))
                .count()
        })
    }

    /// True if the workspace currently has no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, key: &str) -> bool {
        let now = now_micros();
        self.store
            .read(|t| t.entries.get(key).and_then(|row| row.expires_at).map(|exp| exp <= now).unwrap_or(false))
    }
}

fn reject_empty_value(value: &Value) -> Result<()> {
    if value.is_null() || value.is_empty_text() {
        return Err(Error::empty_value());
    }
    Ok(())
}

fn get_subpath<'v>(value: &'v Value, subpath: &str) -> Result<&'v Value> {
    let mut current = value;
    for segment in subpath.split('.') {
        current = match current {
            Value::Map(m) => m.get(segment).ok_or(Error::SubpathNotFound)?,
            Value::List(items) => {
                let idx: usize = segment.parse().map_err(|_| Error::SubpathNotFound)?;
                items.get(idx).ok_or(Error::SubpathNotFound)?
            }
            _ => return Err(Error::SubpathNotFound),
        };
    }
    Ok(current)
}

fn set_subpath(value: &mut Value, subpath: &str, new_value: Value) -> Result<()> {
    let segments: Vec<&str> = subpath.split('.').collect();
    set_subpath_rec(value, &segments, new_value)
}

fn set_subpath_rec(value: &mut Value, segments: &[&str], new_value: Value) -> Result<()> {
    let (head, rest) = segments.split_first().ok_or(Error::SubpathNotFound)?;
    match value {
        Value::Map(m) => {
            if rest.is_empty() {
                m.insert((*head).to_string(), new_value);
                Ok(())
            } else {
                let entry = m.get_mut(*head).ok_or(Error::SubpathNotFound)?;
                set_subpath_rec(entry, rest, new_value)
            }
        }
        Value::List(items) => {
            let idx: usize = head.parse().map_err(|_| Error::SubpathNotFound)?;
            if rest.is_empty() {
                let slot = items.get_mut(idx).ok_or(Error::SubpathNotFound)?;
                *slot = new_value;
                Ok(())
            } else {
                let entry = items.get_mut(idx).ok_or(Error::SubpathNotFound)?;
                set_subpath_rec(entry, rest, new_value)
            }
        }
        _ => Err(Error::SubpathNotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use tempfile::tempdir;

    fn open_ws() -> (tempfile::TempDir, Workspace) {
        let dir = tempdir().unwrap();
        let config = EngineConfig::new(dir.path());
        let ws = Workspace::open("default", &dir.path().join("default"), &config).unwrap();
        (dir, ws)
    }

    #[test]
    fn save_then_getkey_round_trips() {
        let (_dir, ws) = open_ws();
        ws.save("name", Value::Text("balu".to_string()), None).unwrap();
        assert_eq!(ws.getkey("name", true).unwrap(), Value::Text("balu".to_string()));
    }

    #[test]
    fn save_reports_created_then_overwritten_then_nochange() {
        let (_dir, ws) = open_ws();
        assert_eq!(ws.save("k", Value::Int(1), None).unwrap(), SaveOutcome::Created);
        assert_eq!(ws.save("k", Value::Int(2), None).unwrap(), SaveOutcome::Overwritten);
        assert_eq!(ws.save("k", Value::Int(2), None).unwrap(), SaveOutcome::NoChange);
    }

    #[test]
    fn empty_value_is_rejected() {
        let (_dir, ws) = open_ws();
        let err = ws.save("k", Value::Text(String::new()), None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn getkey_with_dotted_subpath() {
        let (_dir, ws) = open_ws();
        let mut map = std::collections::BTreeMap::new();
        map.insert("name".to_string(), Value::Text("balu".to_string()));
        map.insert("age".to_string(), Value::Int(30));
        ws.save("user", Value::Map(map), None).unwrap();
        assert_eq!(ws.getkey("user.name", true).unwrap(), Value::Text("balu".to_string()));
    }

    #[test]
    fn getkey_missing_subpath_is_distinct_from_missing_key() {
        let (_dir, ws) = open_ws();
        let mut map = std::collections::BTreeMap::new();
        map.insert("name".to_string(), Value::Text("balu".to_string()));
        ws.save("user", Value::Map(map), None).unwrap();
        assert!(matches!(ws.getkey("user.missing", true), Err(Error::SubpathNotFound)));
        assert!(matches!(ws.getkey("ghost", true), Err(Error::NotFound)));
    }

    #[test]
    fn patch_updates_history() {
        let (_dir, ws) = open_ws();
        ws.save("q", Value::Text("x".to_string()), None).unwrap();
        ws.patch("q", Value::Text("y".to_string())).unwrap();
        assert_eq!(ws.getkey("q", true).unwrap(), Value::Text("y".to_string()));
    }

    #[test]
    fn push_creates_list_and_appends() {
        let (_dir, ws) = open_ws();
        ws.push_value("tags", Value::Text("a".to_string()), false).unwrap();
        ws.push_value("tags", Value::Text("b".to_string()), false).unwrap();
        assert_eq!(
            ws.getkey("tags", true).unwrap(),
            Value::List(vec![Value::Text("a".to_string()), Value::Text("b".to_string())])
        );
    }

    #[test]
    fn push_unique_skips_duplicate() {
        let (_dir, ws) = open_ws();
        ws.push_value("tags", Value::Text("a".to_string()), true).unwrap();
        let outcome = ws.push_value("tags", Value::Text("a".to_string()), true).unwrap();
        assert_eq!(outcome, SaveOutcome::NoChange);
    }

    #[test]
    fn remove_drops_matching_elements() {
        let (_dir, ws) = open_ws();
        ws.push_value("tags", Value::Text("a".to_string()), false).unwrap();
        ws.push_value("tags", Value::Text("b".to_string()), false).unwrap();
        ws.push_value("tags", Value::Text("a".to_string()), false).unwrap();
        ws.remove_value("tags", &Value::Text("a".to_string())).unwrap();
        assert_eq!(ws.getkey("tags", true).unwrap(), Value::List(vec![Value::Text("b".to_string())]));
    }

    #[test]
    fn delete_then_restore_revives_latest_value() {
        let (_dir, ws) = open_ws();
        ws.save("k", Value::Text("v1".to_string()), None).unwrap();
        ws.save("k", Value::Text("v2".to_string()), None).unwrap();
        ws.delete("k").unwrap();
        assert!(matches!(ws.getkey("k", true), Err(Error::NotFound)));
        ws.restore("k", None).unwrap();
        assert_eq!(ws.getkey("k", true).unwrap(), Value::Text("v2".to_string()));
    }

    #[test]
    fn listkeys_filters_by_pattern() {
        let (_dir, ws) = open_ws();
        ws.save("user:1", Value::Int(1), None).unwrap();
        ws.save("user:2", Value::Int(2), None).unwrap();
        ws.save("order:1", Value::Int(3), None).unwrap();
        let mut keys = ws.listkeys(Some("^user:")).unwrap();
        keys.sort();
        assert_eq!(keys, vec!["user:1".to_string(), "user:2".to_string()]);
    }

    #[test]
    fn save_many_is_all_or_nothing_on_validation_failure() {
        let (_dir, ws) = open_ws();
        let items = vec![
            ("a".to_string(), Value::Int(1), None),
            ("".to_string(), Value::Int(2), None),
        ];
        assert!(ws.save_many(items).is_err());
        assert!(!ws.contains_key("a"));
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(32))]

        #[test]
        fn saving_the_same_int_twice_is_always_nochange(v in proptest::prelude::any::<i64>()) {
            let (_dir, ws) = open_ws();
            ws.save("k", Value::Int(v), None).unwrap();
            let outcome = ws.save("k", Value::Int(v), None).unwrap();
            proptest::prop_assert_eq!(outcome, SaveOutcome::NoChange);
        }

        #[test]
        fn saving_a_different_int_is_never_nochange(a in proptest::prelude::any::<i64>(), b in proptest::prelude::any::<i64>()) {
            proptest::prop_assume!(a != b);
            let (_dir, ws) = open_ws();
            ws.save("k", Value::Int(a), None).unwrap();
            let outcome = ws.save("k", Value::Int(b), None).unwrap();
            proptest::prop_assert_eq!(outcome, SaveOutcome::Overwritten);
        }
    }
}
